//! `ledgerly-store` — committed state, unit-of-work orchestration, read models.
//!
//! The store is where the domain crates meet: it holds the authoritative
//! state for every scope, runs each operation as a single unit of work
//! (decide on clones, commit infallibly, publish afterwards) and feeds the
//! committed events to projections via the bus.

pub mod projections;
pub mod read_model;
pub mod service;

mod state;

#[cfg(test)]
mod integration_tests;

pub use read_model::{InMemoryScopedStore, ScopedStore};
pub use service::{LedgerService, StoreError, StoreResult};
