//! Store key construction for a queue instance
//!
//! The key shapes are a wire-compatibility constraint: other implementations
//! sharing the same store address the same queue through these exact strings,
//! including the `:` separator.

use crate::value_objects::{ItemId, QueueName};

/// Precomputed store keys and channels for one queue
#[derive(Debug, Clone)]
pub struct KeySchema {
    prefix: String,
    ready: String,
    in_flight: String,
    delayed: String,
    dead: String,
    maintenance_lock: String,
}

impl KeySchema {
    /// Build the schema for a queue name
    #[must_use]
    pub fn new(name: &QueueName) -> Self {
        let prefix = format!("q:{name}");
        Self {
            ready: format!("{prefix}:in"),
            in_flight: format!("{prefix}:work"),
            delayed: format!("{prefix}:wait"),
            dead: format!("{prefix}:dead"),
            maintenance_lock: format!("{name}-maintenance"),
            prefix,
        }
    }

    /// List of ids awaiting dequeue
    #[must_use]
    pub fn ready_list(&self) -> &str {
        &self.ready
    }

    /// List of ids currently leased to a consumer
    #[must_use]
    pub fn in_flight_list(&self) -> &str {
        &self.in_flight
    }

    /// List of ids waiting out their retry delay
    #[must_use]
    pub fn delayed_list(&self) -> &str {
        &self.delayed
    }

    /// List of ids that exhausted their retries
    #[must_use]
    pub fn dead_list(&self) -> &str {
        &self.dead
    }

    /// Pub/sub channel that wakes idle consumers; shares the ready-list name
    #[must_use]
    pub fn notification_channel(&self) -> &str {
        &self.ready
    }

    /// Name of the distributed lock serializing maintenance passes
    #[must_use]
    pub fn maintenance_lock(&self) -> &str {
        &self.maintenance_lock
    }

    /// Serialized payload of one item
    #[must_use]
    pub fn payload(&self, id: &ItemId) -> String {
        format!("{}:{id}", self.prefix)
    }

    /// Dequeue-attempt counter of one item
    #[must_use]
    pub fn attempts(&self, id: &ItemId) -> String {
        format!("{}:{id}:attempts", self.prefix)
    }

    /// Timestamp of the item's first enqueue
    #[must_use]
    pub fn enqueued_time(&self, id: &ItemId) -> String {
        format!("{}:{id}:enqueued", self.prefix)
    }

    /// Timestamp of the item's last move to in-flight
    #[must_use]
    pub fn dequeued_time(&self, id: &ItemId) -> String {
        format!("{}:{id}:dequeued", self.prefix)
    }

    /// Earliest time a delayed item may return to the ready list
    #[must_use]
    pub fn wait_time(&self, id: &ItemId) -> String {
        format!("{}:{id}:wait", self.prefix)
    }
}
