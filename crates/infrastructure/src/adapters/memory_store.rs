//! In-memory store adapter
//!
//! Reference implementation of the store port with Redis-like semantics:
//! TTL-bearing values, ordered lists, an atomic cross-list pop-and-push, and
//! command sequences applied under a single state guard, which makes
//! transactions all-or-nothing. Suited to tests and single-process
//! deployments; a networked store adapter replaces it in shared setups.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use application::{ApplicationError, QueueStorePort, StoreCommand};
use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct ValueEntry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

impl ValueEntry {
    fn new(bytes: Vec<u8>, ttl: Duration) -> Self {
        Self {
            bytes,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Default)]
struct StoreState {
    values: HashMap<String, ValueEntry>,
    lists: HashMap<String, VecDeque<String>>,
}

impl StoreState {
    fn purge_expired(&mut self, key: &str) {
        if self.values.get(key).is_some_and(ValueEntry::is_expired) {
            self.values.remove(key);
        }
    }

    fn live_value(&mut self, key: &str) -> Option<&ValueEntry> {
        self.purge_expired(key);
        self.values.get(key)
    }

    fn integer_value(&mut self, key: &str) -> Result<i64, ApplicationError> {
        match self.live_value(key) {
            None => Ok(0),
            Some(entry) => std::str::from_utf8(&entry.bytes)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| {
                    ApplicationError::Store(format!("value at {key} is not an integer"))
                }),
        }
    }

    fn increment(&mut self, key: &str, delta: i64, ttl: Duration) -> Result<i64, ApplicationError> {
        let next = self.integer_value(key)?.saturating_add(delta);
        self.values.insert(
            key.to_string(),
            ValueEntry::new(next.to_string().into_bytes(), ttl),
        );
        Ok(next)
    }

    fn remove_from_list(&mut self, list: &str, value: &str) -> u64 {
        let Some(entries) = self.lists.get_mut(list) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|entry| entry != value);
        (before - entries.len()) as u64
    }

    /// Check a command without mutating state; keeps transactions atomic
    fn validate(&mut self, command: &StoreCommand) -> Result<(), ApplicationError> {
        if let StoreCommand::Increment { key, .. } = command {
            self.integer_value(key)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: StoreCommand) -> Result<(), ApplicationError> {
        match command {
            StoreCommand::Set { key, value, ttl } => {
                self.values.insert(key, ValueEntry::new(value, ttl));
            }
            StoreCommand::Delete { key } => {
                self.values.remove(&key);
                self.lists.remove(&key);
            }
            StoreCommand::Expire { key, ttl } => {
                self.purge_expired(&key);
                if let Some(entry) = self.values.get_mut(&key) {
                    entry.expires_at = Instant::now() + ttl;
                }
            }
            StoreCommand::Increment { key, delta, ttl } => {
                self.increment(&key, delta, ttl)?;
            }
            StoreCommand::HeadPush { list, value } => {
                self.lists.entry(list).or_default().push_front(value);
            }
            StoreCommand::RemoveFromList { list, value } => {
                self.remove_from_list(&list, &value);
            }
        }
        Ok(())
    }
}

/// In-memory implementation of [`QueueStorePort`]
#[derive(Default)]
pub struct InMemoryQueueStore {
    state: Mutex<StoreState>,
}

impl std::fmt::Debug for InMemoryQueueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("InMemoryQueueStore")
            .field("values", &state.values.len())
            .field("lists", &state.lists.len())
            .finish()
    }
}

impl InMemoryQueueStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStorePort for InMemoryQueueStore {
    async fn add(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<bool, ApplicationError> {
        let mut state = self.state.lock();
        state.purge_expired(key);
        if state.values.contains_key(key) {
            return Ok(false);
        }
        state
            .values
            .insert(key.to_string(), ValueEntry::new(value, ttl));
        Ok(true)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), ApplicationError> {
        self.state
            .lock()
            .values
            .insert(key.to_string(), ValueEntry::new(value, ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ApplicationError> {
        Ok(self
            .state
            .lock()
            .live_value(key)
            .map(|entry| entry.bytes.clone()))
    }

    async fn delete(&self, key: &str) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        state.values.remove(key);
        state.lists.remove(key);
        Ok(())
    }

    async fn increment(
        &self,
        key: &str,
        delta: i64,
        ttl: Duration,
    ) -> Result<i64, ApplicationError> {
        self.state.lock().increment(key, delta, ttl)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        state.purge_expired(key);
        if let Some(entry) = state.values.get_mut(key) {
            entry.expires_at = Instant::now() + ttl;
        }
        Ok(())
    }

    async fn list_length(&self, list: &str) -> Result<u64, ApplicationError> {
        Ok(self
            .state
            .lock()
            .lists
            .get(list)
            .map_or(0, |entries| entries.len() as u64))
    }

    async fn head_push(&self, list: &str, value: &str) -> Result<(), ApplicationError> {
        self.state
            .lock()
            .lists
            .entry(list.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn tail_pop_and_head_push(
        &self,
        src: &str,
        dst: &str,
    ) -> Result<Option<String>, ApplicationError> {
        let mut state = self.state.lock();
        let Some(value) = state.lists.get_mut(src).and_then(VecDeque::pop_back) else {
            return Ok(None);
        };
        state
            .lists
            .entry(dst.to_string())
            .or_default()
            .push_front(value.clone());
        Ok(Some(value))
    }

    async fn remove(&self, list: &str, value: &str) -> Result<u64, ApplicationError> {
        Ok(self.state.lock().remove_from_list(list, value))
    }

    async fn range(&self, list: &str) -> Result<Vec<String>, ApplicationError> {
        Ok(self
            .state
            .lock()
            .lists
            .get(list)
            .map_or_else(Vec::new, |entries| entries.iter().cloned().collect()))
    }

    async fn transaction(&self, commands: Vec<StoreCommand>) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        for command in &commands {
            state.validate(command)?;
        }
        for command in commands {
            state.apply(command)?;
        }
        Ok(())
    }

    async fn batch(&self, commands: Vec<StoreCommand>) -> Result<(), ApplicationError> {
        let mut state = self.state.lock();
        for command in commands {
            state.apply(command)?;
        }
        Ok(())
    }
}
