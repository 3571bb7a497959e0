//! Queue behavior hooks
//!
//! A queue carries an ordered chain of behaviors that observe its
//! operations. `on_enqueuing` may veto, aborting the enqueue with the
//! rejected outcome; the remaining hooks are pure notifications.

use async_trait::async_trait;
use domain::ItemId;

/// Observer chain around queue operations
///
/// Every hook has a no-op default, so implementors override only what they
/// care about.
#[async_trait]
pub trait QueueBehavior<T: Send + Sync>: Send + Sync {
    /// Inspect a payload before anything is stored; `false` vetoes the enqueue
    async fn on_enqueuing(&self, _payload: &T) -> bool {
        true
    }

    /// Called after an item reaches the ready list
    async fn on_enqueued(&self, _id: &ItemId) {}

    /// Called after an item is leased to a consumer
    async fn on_dequeued(&self, _id: &ItemId) {}

    /// Called after an item is completed and its records removed
    async fn on_completed(&self, _id: &ItemId) {}

    /// Called after an item is abandoned
    async fn on_abandoned(&self, _id: &ItemId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DefaultBehavior;

    #[async_trait]
    impl QueueBehavior<String> for DefaultBehavior {}

    #[tokio::test]
    async fn default_hooks_do_not_veto() {
        let behavior = DefaultBehavior;
        assert!(behavior.on_enqueuing(&"payload".to_string()).await);
        behavior.on_enqueued(&ItemId::new()).await;
        behavior.on_completed(&ItemId::new()).await;
    }
}
