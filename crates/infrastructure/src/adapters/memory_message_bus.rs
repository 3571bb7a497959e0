//! In-memory notification bus adapter
//!
//! Models a single shared broker: every queue instance holding the same bus
//! sees every publish, which is how multi-consumer wake-up is simulated in
//! one process. Handlers run inline on the publisher's task.

use application::{ApplicationError, MessageBusPort, NotificationHandler};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-memory implementation of [`MessageBusPort`]
#[derive(Default)]
pub struct InMemoryMessageBus {
    subscribers: Mutex<HashMap<String, Vec<NotificationHandler>>>,
}

impl std::fmt::Debug for InMemoryMessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers = self.subscribers.lock();
        f.debug_struct("InMemoryMessageBus")
            .field("channels", &subscribers.len())
            .field(
                "handlers",
                &subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl InMemoryMessageBus {
    /// Create a bus with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBusPort for InMemoryMessageBus {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), ApplicationError> {
        let handlers: Vec<NotificationHandler> = self
            .subscribers
            .lock()
            .get(channel)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(message);
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
        handler: NotificationHandler,
    ) -> Result<(), ApplicationError> {
        self.subscribers
            .lock()
            .entry(channel.to_string())
            .or_default()
            .push(handler);
        Ok(())
    }

    async fn unsubscribe_all(&self) -> Result<(), ApplicationError> {
        self.subscribers.lock().clear();
        Ok(())
    }
}
