//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, nothing to undo). Storage failures belong to the infra layer
/// and are reported as warnings there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (bad size code, non-positive quantity, empty style...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A style or carton entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Undo was requested for a style with no entries.
    #[error("nothing to undo for style '{0}'")]
    EmptyLedger(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn empty_ledger(style: impl Into<String>) -> Self {
        Self::EmptyLedger(style.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}
