//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (invariants,
/// identifiers, empty submissions, amount range). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure, non-positive value).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// No line item survived validation, so there is nothing to invoice.
    #[error("no valid items added")]
    NoValidItems,

    /// A computed amount does not fit the decimal range.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),
}

impl DomainError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::AmountOutOfRange(msg.into())
    }
}
