//! Consumer-visible handle for one dequeued item

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::ItemId;

use crate::error::ApplicationError;

const PENDING: u8 = 0;
const COMPLETED: u8 = 1;
const ABANDONED: u8 = 2;

/// Settlement state shared between an entry and the worker runloop
///
/// Guards against double settlement: once completed or abandoned, the entry
/// never touches the store again, and the runloop's auto-complete path skips
/// entries the handler already settled.
#[derive(Debug, Default)]
pub(crate) struct Settlement(AtomicU8);

impl Settlement {
    pub(crate) fn is_settled(&self) -> bool {
        self.0.load(Ordering::SeqCst) != PENDING
    }

    fn try_transition(&self, to: u8) -> bool {
        self.0
            .compare_exchange(PENDING, to, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn revert(&self, from: u8) {
        let _ = self
            .0
            .compare_exchange(from, PENDING, Ordering::SeqCst, Ordering::SeqCst);
    }
}

/// Back-reference from an entry to the queue that produced it
///
/// Maintenance abandons time-out victims through the queue directly; this
/// handle only serves user-initiated settlement from an entry.
#[async_trait]
pub(crate) trait EntryQueueHandle: Send + Sync {
    async fn complete_entry(&self, id: &ItemId) -> Result<(), ApplicationError>;
    async fn abandon_entry(&self, id: &ItemId) -> Result<(), ApplicationError>;
    async fn renew_entry_lock(&self, id: &ItemId) -> Result<(), ApplicationError>;
}

/// One dequeued work item with its envelope
pub struct QueueEntry<T> {
    id: ItemId,
    payload: T,
    enqueued_at: DateTime<Utc>,
    attempt: u32,
    settlement: Arc<Settlement>,
    queue: Arc<dyn EntryQueueHandle>,
}

impl<T> fmt::Debug for QueueEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEntry")
            .field("id", &self.id)
            .field("enqueued_at", &self.enqueued_at)
            .field("attempt", &self.attempt)
            .field("settled", &self.settlement.is_settled())
            .finish_non_exhaustive()
    }
}

impl<T> QueueEntry<T> {
    pub(crate) fn new(
        id: ItemId,
        payload: T,
        enqueued_at: DateTime<Utc>,
        attempt: u32,
        queue: Arc<dyn EntryQueueHandle>,
    ) -> Self {
        Self {
            id,
            payload,
            enqueued_at,
            attempt,
            settlement: Arc::new(Settlement::default()),
            queue,
        }
    }

    /// The item's id
    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// The deserialized payload
    #[must_use]
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// When the item was first enqueued
    #[must_use]
    pub const fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    /// Which delivery attempt this entry represents (0 for a fresh item)
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether the entry has been completed or abandoned
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settlement.is_settled()
    }

    pub(crate) fn settlement(&self) -> Arc<Settlement> {
        Arc::clone(&self.settlement)
    }

    /// Mark the item processed and remove every record of it
    ///
    /// # Errors
    ///
    /// Returns an invalid-operation error if the entry is already settled; a
    /// store failure leaves the entry unsettled so the call can be retried.
    pub async fn complete(&self) -> Result<(), ApplicationError> {
        if !self.settlement.try_transition(COMPLETED) {
            return Err(ApplicationError::InvalidOperation(format!(
                "entry {} is already settled",
                self.id
            )));
        }
        if let Err(e) = self.queue.complete_entry(&self.id).await {
            self.settlement.revert(COMPLETED);
            return Err(e);
        }
        Ok(())
    }

    /// Give the item back for retry or dead-lettering
    ///
    /// # Errors
    ///
    /// Returns an invalid-operation error if the entry is already settled; a
    /// store failure leaves the entry unsettled so the call can be retried.
    pub async fn abandon(&self) -> Result<(), ApplicationError> {
        if !self.settlement.try_transition(ABANDONED) {
            return Err(ApplicationError::InvalidOperation(format!(
                "entry {} is already settled",
                self.id
            )));
        }
        if let Err(e) = self.queue.abandon_entry(&self.id).await {
            self.settlement.revert(ABANDONED);
            return Err(e);
        }
        Ok(())
    }

    /// Extend the in-flight lease of a long-running handler
    pub async fn renew_lock(&self) -> Result<(), ApplicationError> {
        if self.settlement.is_settled() {
            return Err(ApplicationError::InvalidOperation(format!(
                "entry {} is already settled",
                self.id
            )));
        }
        self.queue.renew_entry_lock(&self.id).await
    }
}
