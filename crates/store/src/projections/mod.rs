//! Projection implementations (read model builders).
//!
//! Projections consume journal events off the bus and build query-optimized
//! read models. All projections are:
//! - **Rebuildable**: Can be reconstructed from the event stream
//! - **Scope-isolated**: Data is partitioned by tenant and branch
//! - **Idempotent**: Safe for at-least-once delivery
//!
//! Read models are advisory; the balances the service hands out remain the
//! authoritative ones.

pub mod account_activity;

pub use account_activity::{AccountActivity, AccountActivityProjection, ActivityProjectionError};
