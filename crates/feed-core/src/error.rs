//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid or expired session: {0}")]
    InvalidSession(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Storage failures are transient; the read path can be retried as a whole.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::StorageError(_))
    }
}
