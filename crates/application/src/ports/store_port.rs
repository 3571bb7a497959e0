//! Port for the shared queue store
//!
//! The store is the single source of truth for queue state. Implementations
//! provide Redis-like semantics: TTL-bearing values, ordered lists with an
//! atomic cross-list pop-and-push, all-or-nothing transactions, and
//! pipelined batches. Integer values addressed by `increment` are stored in
//! ASCII decimal form.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// One mutation inside a [`QueueStorePort::transaction`] or [`QueueStorePort::batch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCommand {
    /// Set a value with a TTL, overwriting any existing value
    Set {
        key: String,
        value: Vec<u8>,
        ttl: Duration,
    },
    /// Delete a key (value or list)
    Delete { key: String },
    /// Reset the TTL of an existing key
    Expire { key: String, ttl: Duration },
    /// Add to an integer value, creating it with the TTL when absent
    Increment { key: String, delta: i64, ttl: Duration },
    /// Push a value onto the head of a list
    HeadPush { list: String, value: String },
    /// Remove every occurrence of a value from a list
    RemoveFromList { list: String, value: String },
}

/// Port for the key/value + list store backing a queue
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QueueStorePort: Send + Sync {
    /// Store a value only if the key does not already exist
    ///
    /// Returns `true` when the value was added, `false` when the key was
    /// already present.
    async fn add(&self, key: &str, value: Vec<u8>, ttl: Duration)
    -> Result<bool, ApplicationError>;

    /// Store a value unconditionally
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), ApplicationError>;

    /// Fetch a value; `None` when missing or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ApplicationError>;

    /// Delete a key (value or list)
    async fn delete(&self, key: &str) -> Result<(), ApplicationError>;

    /// Add to an integer value, creating it with the TTL when absent
    ///
    /// Returns the value after the addition.
    async fn increment(
        &self,
        key: &str,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, ApplicationError>;

    /// Reset the TTL of an existing key; a no-op when the key is missing
    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), ApplicationError>;

    /// Number of entries in a list
    async fn list_length(&self, list: &str) -> Result<u64, ApplicationError>;

    /// Push a value onto the head of a list
    async fn head_push(&self, list: &str, value: &str) -> Result<(), ApplicationError>;

    /// Atomically pop the tail of `src` and push it onto the head of `dst`
    async fn tail_pop_and_head_push(
        &self,
        src: &str,
        dst: &str,
    ) -> Result<Option<String>, ApplicationError>;

    /// Remove every occurrence of a value from a list
    ///
    /// Returns how many entries were removed.
    async fn remove(&self, list: &str, value: &str) -> Result<u64, ApplicationError>;

    /// All values of a list, head to tail
    async fn range(&self, list: &str) -> Result<Vec<String>, ApplicationError>;

    /// Apply commands all-or-nothing
    ///
    /// A transaction that does not commit must surface as an error; partial
    /// application is never acceptable.
    async fn transaction(&self, commands: Vec<StoreCommand>) -> Result<(), ApplicationError>;

    /// Apply commands pipelined, without atomicity
    async fn batch(&self, commands: Vec<StoreCommand>) -> Result<(), ApplicationError>;
}
