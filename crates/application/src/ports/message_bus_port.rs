//! Port for the advisory notification channel
//!
//! The channel only wakes idle consumers; it carries no durable state. A
//! consumer that wakes and finds nothing on the ready list simply parks
//! again, so lost or duplicated messages are harmless.

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Callback invoked for every message observed on a subscribed channel
///
/// Handlers run on whatever context the bus implementation provides and must
/// be safe to invoke concurrently with queue operations.
pub type NotificationHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Port for the publish/subscribe channel between producers and consumers
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessageBusPort: Send + Sync {
    /// Publish a message to every subscriber of a channel
    async fn publish(&self, channel: &str, message: &str) -> Result<(), ApplicationError>;

    /// Register a handler for messages on a channel
    async fn subscribe(
        &self,
        channel: &str,
        handler: NotificationHandler,
    ) -> Result<(), ApplicationError>;

    /// Drop every subscription this client holds
    async fn unsubscribe_all(&self) -> Result<(), ApplicationError>;
}
