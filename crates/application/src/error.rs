//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Transient store or transport failure
    #[error("Store error: {0}")]
    Store(String),

    /// A transactional cross-list move did not commit
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The store is in a state the queue protocol forbids
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Capability intentionally absent from this queue
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Caller misused the queue API
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::TransactionFailed(_))
    }
}
