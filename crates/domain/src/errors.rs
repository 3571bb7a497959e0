//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Item id is not a 32-character hex string
    #[error("Invalid item id: {0}")]
    InvalidItemId(String),

    /// Queue name is empty after sanitization
    #[error("Invalid queue name: {0:?}")]
    InvalidQueueName(String),
}
