//! Metrics-emitting queue behavior
//!
//! Publishes per-queue counters through the `metrics` facade. Attached via
//! the behavior chain, so the engine itself stays free of metric sinks;
//! embedders install whatever recorder they already run.

use application::QueueBehavior;
use async_trait::async_trait;
use domain::{ItemId, QueueName};
use metrics::counter;

/// Behavior that counts queue operations, labeled with the queue name
#[derive(Debug, Clone)]
pub struct MetricsQueueBehavior {
    queue_name: String,
}

impl MetricsQueueBehavior {
    /// Create a behavior reporting under the given queue name
    #[must_use]
    pub fn new(name: &QueueName) -> Self {
        Self {
            queue_name: name.to_string(),
        }
    }
}

#[async_trait]
impl<T: Send + Sync> QueueBehavior<T> for MetricsQueueBehavior {
    async fn on_enqueued(&self, _id: &ItemId) {
        counter!("relayq_enqueued_total", "queue" => self.queue_name.clone()).increment(1);
    }

    async fn on_dequeued(&self, _id: &ItemId) {
        counter!("relayq_dequeued_total", "queue" => self.queue_name.clone()).increment(1);
    }

    async fn on_completed(&self, _id: &ItemId) {
        counter!("relayq_completed_total", "queue" => self.queue_name.clone()).increment(1);
    }

    async fn on_abandoned(&self, _id: &ItemId) {
        counter!("relayq_abandoned_total", "queue" => self.queue_name.clone()).increment(1);
    }
}
