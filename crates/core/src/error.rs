//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// double-entry invariants, state machines, uniqueness). Infrastructure
/// concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (malformed input, non-positive amount,
    /// future-dated entry, cross-tenant/branch reference).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The double-entry invariant does not hold for a journal entry
    /// (fewer than two lines, or total debit != total credit).
    #[error("balance mismatch: {0}")]
    BalanceMismatch(String),

    /// An operation was attempted against a record whose status forbids it
    /// (posting a posted entry, paying a draft expense, ...).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A uniqueness or referential guarantee would be broken (duplicate
    /// journal reference or account code, delete of a referenced account).
    #[error("integrity violation: {0}")]
    Integrity(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn balance_mismatch(msg: impl Into<String>) -> Self {
        Self::BalanceMismatch(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::Integrity(msg.into())
    }
}
