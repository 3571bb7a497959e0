//! Reliable at-least-once work queue over a shared store
//!
//! State lives in four store lists (ready, in-flight, delayed, dead) plus
//! per-item sidecar keys; this module owns the transitions between them.
//! Dequeue moves an id from ready to in-flight in a single atomic store
//! operation, so competing consumers never observe an id on two lists.
//! Crash recovery is cooperative: any participant may win the throttled
//! maintenance lock and expire stale leases on behalf of the crashed one.

mod entry;
mod maintenance;
mod worker;

pub use entry::QueueEntry;
pub use worker::HandlerError;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{ItemId, KeySchema, QueueConfig, QueueName, QueueStats};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{
    DistributedLockPort, JsonCodec, MessageBusPort, NotificationHandler, PayloadCodec,
    QueueBehavior, QueueStorePort, StoreCommand,
};

use entry::EntryQueueHandle;
use worker::WorkerHandle;

/// Dequeue timeout applied when the caller does not pass one
const DEFAULT_DEQUEUE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on one park interval while a dequeue waits for work
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long a maintenance participant waits for the throttled lock
const MAINTENANCE_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of an enqueue attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The payload was stored and the item is on the ready list
    Enqueued(ItemId),
    /// A behavior vetoed the enqueue; nothing was stored
    Rejected,
}

impl EnqueueOutcome {
    /// The id when the item was enqueued
    #[must_use]
    pub const fn id(&self) -> Option<&ItemId> {
        match self {
            Self::Enqueued(id) => Some(id),
            Self::Rejected => None,
        }
    }
}

/// Cumulative per-instance counters backing [`QueueStats`]
#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    completed: AtomicU64,
    abandoned: AtomicU64,
    worker_errors: AtomicU64,
    timeouts: AtomicU64,
}

impl QueueCounters {
    fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.dequeued.store(0, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
        self.abandoned.store(0, Ordering::Relaxed);
        self.worker_errors.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
    }
}

/// A reliable at-least-once work queue for payloads of type `T`
///
/// Cloning is cheap; clones share the same underlying instance, counters,
/// and worker slot. Any number of enqueues, dequeues, completes, and
/// abandons may run concurrently.
pub struct WorkQueue<T: Send + Sync> {
    inner: Arc<QueueInner<T>>,
}

impl<T: Send + Sync> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync> std::fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("name", &self.inner.name)
            .field("disposed", &self.inner.disposal.is_cancelled())
            .finish_non_exhaustive()
    }
}

struct QueueInner<T: Send + Sync> {
    name: QueueName,
    keys: KeySchema,
    config: QueueConfig,
    store: Arc<dyn QueueStorePort>,
    bus: Arc<dyn MessageBusPort>,
    lock: Arc<dyn DistributedLockPort>,
    codec: Arc<dyn PayloadCodec<T>>,
    behaviors: Vec<Arc<dyn QueueBehavior<T>>>,
    counters: QueueCounters,
    wake: Notify,
    disposal: CancellationToken,
    subscribed: AtomicBool,
    worker: Mutex<Option<WorkerHandle>>,
    maintenance_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + Sync> Drop for QueueInner<T> {
    fn drop(&mut self) {
        self.disposal.cancel();
        if let Some(handle) = self.maintenance_task.lock().take() {
            handle.abort();
        }
        if let Some(worker) = self.worker.lock().take() {
            worker.cancel.cancel();
            worker.join.abort();
        }
    }
}

/// Builder for a [`WorkQueue`]
pub struct WorkQueueBuilder<T: Send + Sync> {
    name: Option<QueueName>,
    config: QueueConfig,
    store: Arc<dyn QueueStorePort>,
    bus: Arc<dyn MessageBusPort>,
    lock: Arc<dyn DistributedLockPort>,
    codec: Arc<dyn PayloadCodec<T>>,
    behaviors: Vec<Arc<dyn QueueBehavior<T>>>,
}

impl<T: Send + Sync> std::fmt::Debug for WorkQueueBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueueBuilder")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("behaviors", &self.behaviors.len())
            .finish_non_exhaustive()
    }
}

impl<T> WorkQueueBuilder<T>
where
    T: Send + Sync + 'static,
{
    /// Override the queue name (defaults to the payload type name)
    #[must_use]
    pub fn with_name(mut self, name: QueueName) -> Self {
        self.name = Some(name);
        self
    }

    /// Replace the default configuration
    #[must_use]
    pub fn with_config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default JSON codec
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn PayloadCodec<T>>) -> Self {
        self.codec = codec;
        self
    }

    /// Append a behavior to the hook chain
    #[must_use]
    pub fn with_behavior(mut self, behavior: Arc<dyn QueueBehavior<T>>) -> Self {
        self.behaviors.push(behavior);
        self
    }

    /// Construct the queue, starting the maintenance loop when enabled
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn build(self) -> WorkQueue<T> {
        let name = self.name.unwrap_or_else(QueueName::for_payload::<T>);
        let keys = KeySchema::new(&name);
        let inner = Arc::new(QueueInner {
            name,
            keys,
            config: self.config,
            store: self.store,
            bus: self.bus,
            lock: self.lock,
            codec: self.codec,
            behaviors: self.behaviors,
            counters: QueueCounters::default(),
            wake: Notify::new(),
            disposal: CancellationToken::new(),
            subscribed: AtomicBool::new(false),
            worker: Mutex::new(None),
            maintenance_task: Mutex::new(None),
        });

        if inner.config.run_maintenance_tasks {
            let handle = tokio::spawn(maintenance::run_loop(Arc::clone(&inner)));
            *inner.maintenance_task.lock() = Some(handle);
        }

        info!(queue = %inner.name, "Work queue initialized");
        WorkQueue { inner }
    }
}

impl<T> WorkQueue<T>
where
    T: Send + Sync + 'static,
{
    /// Start building a queue around the given collaborators
    pub fn builder(
        store: Arc<dyn QueueStorePort>,
        bus: Arc<dyn MessageBusPort>,
        lock: Arc<dyn DistributedLockPort>,
    ) -> WorkQueueBuilder<T>
    where
        T: Serialize + DeserializeOwned,
    {
        WorkQueueBuilder {
            name: None,
            config: QueueConfig::default(),
            store,
            bus,
            lock,
            codec: Arc::new(JsonCodec),
            behaviors: Vec::new(),
        }
    }

    /// The sanitized queue name
    #[must_use]
    pub fn name(&self) -> &QueueName {
        &self.inner.name
    }

    /// The configuration this instance was built with
    #[must_use]
    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    /// Store a payload and make it available for dequeue
    #[instrument(skip(self, payload), fields(queue = %self.inner.name))]
    pub async fn enqueue(&self, payload: T) -> Result<EnqueueOutcome, ApplicationError> {
        self.inner.enqueue(payload).await
    }

    /// Lease the next available item
    ///
    /// Waits up to `timeout` (default 30 s) for an item, waking early on the
    /// notification channel. Returns `None` on timeout, cancellation, or
    /// disposal.
    #[instrument(skip_all, fields(queue = %self.inner.name))]
    pub async fn dequeue(
        &self,
        timeout: Option<Duration>,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<QueueEntry<T>>, ApplicationError> {
        QueueInner::dequeue(&self.inner, timeout, cancellation).await
    }

    /// Remove a processed item and every record of it
    #[instrument(skip(self), fields(queue = %self.inner.name))]
    pub async fn complete(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.inner.complete(id).await
    }

    /// Give an in-flight item back for retry or dead-lettering
    #[instrument(skip(self), fields(queue = %self.inner.name))]
    pub async fn abandon(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.inner.abandon(id).await
    }

    /// Extend the in-flight lease of an item
    pub async fn renew_lock(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.inner.renew_lock(id).await
    }

    /// Snapshot the list lengths and cumulative counters
    ///
    /// Not transactional across the individual values.
    pub async fn stats(&self) -> Result<QueueStats, ApplicationError> {
        self.inner.stats().await
    }

    /// Remove all four lists, every sidecar key, and reset the counters
    #[instrument(skip(self), fields(queue = %self.inner.name))]
    pub async fn delete_queue(&self) -> Result<(), ApplicationError> {
        self.inner.delete_queue().await
    }

    /// Dead-letter listing is intentionally absent from this queue
    pub async fn dead_letter_items(&self) -> Result<Vec<ItemId>, ApplicationError> {
        Err(ApplicationError::NotSupported(
            "dead letter listing".to_string(),
        ))
    }

    /// Spawn the worker runloop
    ///
    /// The handler is invoked once per dequeued entry. On success the entry
    /// is completed when `auto_complete` is set and the handler did not
    /// settle it; on failure the entry is abandoned. At most one runloop may
    /// be active per queue instance.
    pub fn start_working<F, Fut>(
        &self,
        handler: F,
        auto_complete: bool,
        cancellation: Option<CancellationToken>,
    ) -> Result<(), ApplicationError>
    where
        F: Fn(QueueEntry<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        let mut slot = self.inner.worker.lock();
        if slot.is_some() {
            return Err(ApplicationError::InvalidOperation(
                "a worker runloop is already active for this queue".to_string(),
            ));
        }
        let cancel = cancellation.unwrap_or_default();
        let join = tokio::spawn(worker::run_loop(
            Arc::clone(&self.inner),
            handler,
            auto_complete,
            cancel.clone(),
        ));
        *slot = Some(WorkerHandle { cancel, join });
        info!(queue = %self.inner.name, "Worker started");
        Ok(())
    }

    /// Stop the worker runloop and drop the notification subscription
    pub async fn stop_working(&self) -> Result<(), ApplicationError> {
        let handle = self.inner.worker.lock().take();
        let Some(handle) = handle else {
            return Ok(());
        };
        handle.cancel.cancel();
        self.inner.wake.notify_waiters();
        let _ = handle.join.await;
        self.inner.bus.unsubscribe_all().await?;
        self.inner.subscribed.store(false, Ordering::SeqCst);
        info!(queue = %self.inner.name, "Worker stopped");
        Ok(())
    }

    /// Run one maintenance pass immediately
    ///
    /// Normally the built-in loop drives this under the distributed lock;
    /// exposed so embedders with `run_maintenance_tasks` disabled can drive
    /// maintenance on their own cadence.
    pub async fn maintenance_pass(&self) {
        self.inner.maintenance_pass().await;
    }

    /// Dispose the queue: stop the worker and cancel every pending wait
    ///
    /// Dequeues return `None` immediately after disposal. Store state is
    /// untouched; use [`Self::delete_queue`] to remove it.
    pub async fn shutdown(&self) {
        if self.inner.disposal.is_cancelled() {
            return;
        }
        if let Err(e) = self.stop_working().await {
            warn!(queue = %self.inner.name, error = %e, "Worker shutdown reported an error");
        }
        self.inner.disposal.cancel();
        self.inner.wake.notify_waiters();
        if let Some(handle) = self.inner.maintenance_task.lock().take() {
            handle.abort();
        }
        info!(queue = %self.inner.name, "Work queue shut down");
    }
}

impl<T> QueueInner<T>
where
    T: Send + Sync + 'static,
{
    async fn enqueue(&self, payload: T) -> Result<EnqueueOutcome, ApplicationError> {
        let id = ItemId::new();
        for behavior in &self.behaviors {
            if !behavior.on_enqueuing(&payload).await {
                debug!(queue = %self.name, "Enqueue vetoed by behavior");
                return Ok(EnqueueOutcome::Rejected);
            }
        }

        let bytes = self.codec.encode(&payload)?;
        let ttl = self.config.payload_ttl();
        let added = self.store.add(&self.keys.payload(&id), bytes, ttl).await?;
        if !added {
            return Err(ApplicationError::InvariantViolation(format!(
                "payload key already exists for item {id}"
            )));
        }

        self.store
            .head_push(self.keys.ready_list(), id.as_str())
            .await?;
        self.store
            .set(&self.keys.enqueued_time(&id), encode_ticks(Utc::now()), ttl)
            .await?;
        self.bus
            .publish(self.keys.notification_channel(), id.as_str())
            .await?;
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);

        for behavior in &self.behaviors {
            behavior.on_enqueued(&id).await;
        }
        debug!(queue = %self.name, %id, "Item enqueued");
        Ok(EnqueueOutcome::Enqueued(id))
    }

    /// Subscribe to the notification channel once per instance
    async fn ensure_subscribed(inner: &Arc<Self>) -> Result<(), ApplicationError> {
        if inner.subscribed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let weak = Arc::downgrade(inner);
        let handler: NotificationHandler = Arc::new(move |_message: &str| {
            if let Some(inner) = weak.upgrade() {
                inner.wake.notify_waiters();
            }
        });
        let result = inner
            .bus
            .subscribe(inner.keys.notification_channel(), handler)
            .await;
        if result.is_err() {
            inner.subscribed.store(false, Ordering::SeqCst);
        }
        result
    }

    async fn dequeue(
        inner: &Arc<Self>,
        timeout: Option<Duration>,
        cancellation: Option<CancellationToken>,
    ) -> Result<Option<QueueEntry<T>>, ApplicationError> {
        Self::ensure_subscribed(inner).await?;
        let cancel = cancellation.unwrap_or_default();
        let deadline =
            tokio::time::Instant::now() + timeout.unwrap_or(DEFAULT_DEQUEUE_TIMEOUT);

        loop {
            if inner.disposal.is_cancelled() || cancel.is_cancelled() {
                return Ok(None);
            }

            // Register for wake-ups before polling so a publish racing the
            // empty pop is not lost.
            let notified = inner.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(raw) = inner
                .store
                .tail_pop_and_head_push(inner.keys.ready_list(), inner.keys.in_flight_list())
                .await?
            {
                return Self::lease_popped_item(inner, &raw).await;
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let park = IDLE_POLL_INTERVAL.min(deadline - now);
            tokio::select! {
                () = &mut notified => {}
                () = inner.disposal.cancelled() => return Ok(None),
                () = cancel.cancelled() => return Ok(None),
                () = tokio::time::sleep(park) => {}
            }
        }
    }

    /// Stamp and hydrate an id just moved to the in-flight list
    async fn lease_popped_item(
        inner: &Arc<Self>,
        raw: &str,
    ) -> Result<Option<QueueEntry<T>>, ApplicationError> {
        let Ok(id) = ItemId::parse(raw) else {
            warn!(queue = %inner.name, value = raw, "Dropping malformed id from in-flight list");
            inner.store.remove(inner.keys.in_flight_list(), raw).await?;
            return Ok(None);
        };

        inner
            .store
            .set(
                &inner.keys.dequeued_time(&id),
                encode_ticks(Utc::now()),
                inner.config.dequeued_time_ttl(),
            )
            .await?;

        let Some(bytes) = inner.store.get(&inner.keys.payload(&id)).await? else {
            // Payload expired while the id sat on the ready list.
            debug!(queue = %inner.name, %id, "Removed stale entry without payload");
            inner
                .store
                .remove(inner.keys.in_flight_list(), id.as_str())
                .await?;
            return Ok(None);
        };
        let payload = inner.codec.decode(&bytes)?;

        let enqueued_at = match inner.store.get(&inner.keys.enqueued_time(&id)).await? {
            Some(bytes) => decode_ticks(&bytes).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            None => DateTime::<Utc>::UNIX_EPOCH,
        };
        let attempts = match inner.store.get(&inner.keys.attempts(&id)).await? {
            Some(bytes) => decode_i64(&bytes).unwrap_or(-1),
            None => -1,
        };
        let attempt = u32::try_from(attempts + 1).unwrap_or(0);

        inner.counters.dequeued.fetch_add(1, Ordering::Relaxed);
        let entry = QueueEntry::new(
            id.clone(),
            payload,
            enqueued_at,
            attempt,
            Arc::clone(inner) as Arc<dyn EntryQueueHandle>,
        );
        for behavior in &inner.behaviors {
            behavior.on_dequeued(&id).await;
        }
        debug!(queue = %inner.name, %id, attempt, "Item dequeued");
        Ok(Some(entry))
    }

    async fn complete(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.store
            .batch(vec![
                StoreCommand::RemoveFromList {
                    list: self.keys.in_flight_list().to_string(),
                    value: id.as_str().to_string(),
                },
                StoreCommand::Delete {
                    key: self.keys.payload(id),
                },
                StoreCommand::Delete {
                    key: self.keys.attempts(id),
                },
                StoreCommand::Delete {
                    key: self.keys.enqueued_time(id),
                },
                StoreCommand::Delete {
                    key: self.keys.dequeued_time(id),
                },
                StoreCommand::Delete {
                    key: self.keys.wait_time(id),
                },
            ])
            .await?;
        self.counters.completed.fetch_add(1, Ordering::Relaxed);
        for behavior in &self.behaviors {
            behavior.on_completed(id).await;
        }
        debug!(queue = %self.name, %id, "Item completed");
        Ok(())
    }

    async fn abandon(&self, id: &ItemId) -> Result<(), ApplicationError> {
        let attempts = match self.store.get(&self.keys.attempts(id)).await? {
            Some(bytes) => decode_i64(&bytes).unwrap_or(0),
            None => 0,
        };
        let next_attempt = attempts.saturating_add(1);
        let payload_ttl = self.config.payload_ttl();
        let id_value = id.as_str().to_string();
        let increment = StoreCommand::Increment {
            key: self.keys.attempts(id),
            delta: 1,
            ttl: payload_ttl,
        };
        let remove_in_flight = StoreCommand::RemoveFromList {
            list: self.keys.in_flight_list().to_string(),
            value: id_value.clone(),
        };

        if next_attempt > i64::from(self.config.retries) {
            self.store
                .transaction(vec![
                    remove_in_flight,
                    StoreCommand::HeadPush {
                        list: self.keys.dead_list().to_string(),
                        value: id_value,
                    },
                    StoreCommand::Expire {
                        key: self.keys.payload(id),
                        ttl: self.config.dead_letter_ttl,
                    },
                    increment,
                ])
                .await
                .map_err(as_transaction_failure)?;
            debug!(queue = %self.name, %id, attempt = next_attempt, "Item dead-lettered");
        } else {
            let delay = self
                .config
                .retry_delay_for(u32::try_from(next_attempt).unwrap_or(u32::MAX));
            if delay > Duration::ZERO {
                let wait_until =
                    Utc::now() + chrono::Duration::from_std(delay).unwrap_or_default();
                self.store
                    .transaction(vec![
                        remove_in_flight,
                        StoreCommand::HeadPush {
                            list: self.keys.delayed_list().to_string(),
                            value: id_value,
                        },
                        StoreCommand::Set {
                            key: self.keys.wait_time(id),
                            value: encode_ticks(wait_until),
                            ttl: payload_ttl,
                        },
                        increment,
                    ])
                    .await
                    .map_err(as_transaction_failure)?;
                debug!(
                    queue = %self.name, %id,
                    attempt = next_attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Item delayed for retry"
                );
            } else {
                self.store
                    .transaction(vec![
                        remove_in_flight,
                        StoreCommand::HeadPush {
                            list: self.keys.ready_list().to_string(),
                            value: id_value,
                        },
                        increment,
                    ])
                    .await
                    .map_err(as_transaction_failure)?;
                self.bus
                    .publish(self.keys.notification_channel(), id.as_str())
                    .await?;
                debug!(queue = %self.name, %id, attempt = next_attempt, "Item requeued");
            }
        }

        self.counters.abandoned.fetch_add(1, Ordering::Relaxed);
        for behavior in &self.behaviors {
            behavior.on_abandoned(id).await;
        }
        Ok(())
    }

    async fn renew_lock(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.store
            .set(
                &self.keys.dequeued_time(id),
                encode_ticks(Utc::now()),
                self.config.dequeued_time_ttl(),
            )
            .await
    }

    async fn stats(&self) -> Result<QueueStats, ApplicationError> {
        let ready = self.store.list_length(self.keys.ready_list()).await?;
        let in_flight = self.store.list_length(self.keys.in_flight_list()).await?;
        let dead = self.store.list_length(self.keys.dead_list()).await?;
        Ok(QueueStats {
            ready,
            in_flight,
            dead,
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dequeued: self.counters.dequeued.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            abandoned: self.counters.abandoned.load(Ordering::Relaxed),
            worker_errors: self.counters.worker_errors.load(Ordering::Relaxed),
            timeouts: self.counters.timeouts.load(Ordering::Relaxed),
        })
    }

    async fn delete_queue(&self) -> Result<(), ApplicationError> {
        let lists = [
            self.keys.ready_list(),
            self.keys.in_flight_list(),
            self.keys.delayed_list(),
            self.keys.dead_list(),
        ];
        let mut commands = Vec::new();
        for list in lists {
            for raw in self.store.range(list).await? {
                let Ok(id) = ItemId::parse(&raw) else {
                    continue;
                };
                commands.push(StoreCommand::Delete {
                    key: self.keys.payload(&id),
                });
                commands.push(StoreCommand::Delete {
                    key: self.keys.attempts(&id),
                });
                commands.push(StoreCommand::Delete {
                    key: self.keys.enqueued_time(&id),
                });
                commands.push(StoreCommand::Delete {
                    key: self.keys.dequeued_time(&id),
                });
                commands.push(StoreCommand::Delete {
                    key: self.keys.wait_time(&id),
                });
            }
        }
        for list in lists {
            commands.push(StoreCommand::Delete {
                key: list.to_string(),
            });
        }
        self.store.batch(commands).await?;
        self.counters.reset();
        info!(queue = %self.name, "Queue deleted");
        Ok(())
    }
}

#[async_trait]
impl<T> EntryQueueHandle for QueueInner<T>
where
    T: Send + Sync + 'static,
{
    async fn complete_entry(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.complete(id).await
    }

    async fn abandon_entry(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.abandon(id).await
    }

    async fn renew_entry_lock(&self, id: &ItemId) -> Result<(), ApplicationError> {
        self.renew_lock(id).await
    }
}

/// Classify a non-committed transaction as a retriable fault
fn as_transaction_failure(err: ApplicationError) -> ApplicationError {
    match err {
        ApplicationError::TransactionFailed(_) => err,
        other => ApplicationError::TransactionFailed(other.to_string()),
    }
}

/// Encode a timestamp as ASCII microseconds since the Unix epoch
fn encode_ticks(ts: DateTime<Utc>) -> Vec<u8> {
    ts.timestamp_micros().to_string().into_bytes()
}

/// Decode a timestamp written by [`encode_ticks`]
fn decode_ticks(bytes: &[u8]) -> Option<DateTime<Utc>> {
    decode_i64(bytes).and_then(DateTime::<Utc>::from_timestamp_micros)
}

/// Decode an ASCII decimal integer value
fn decode_i64(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}
