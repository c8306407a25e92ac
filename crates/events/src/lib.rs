//! `ledgerly-events` — domain event plumbing.
//!
//! Event contract, scoped envelopes and a pub/sub bus abstraction with an
//! in-memory implementation. Events are published **after** the store commits;
//! consumers must tolerate duplicates.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
