//! Cooperative queue maintenance
//!
//! Every healthy participant runs this loop; the throttled distributed lock
//! ensures only one of them executes a pass per interval. The loop itself
//! never sleeps between passes: acquisition waits inside the lock provider,
//! which is what sets the cadence.
//!
//! A pass runs three sweeps in order: expire overdue in-flight leases,
//! release due delayed items, and trim dead-letter overflow. Sweep failures
//! are logged and never abort the remaining sweeps; the next pass retries.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;
use domain::ItemId;
use tracing::{debug, warn};

use super::{
    MAINTENANCE_ACQUIRE_TIMEOUT, QueueInner, StoreCommand, decode_ticks, encode_ticks,
};
use crate::error::ApplicationError;

/// Pause after a lock-provider error before trying again
const LOCK_ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub(crate) async fn run_loop<T>(inner: Arc<QueueInner<T>>)
where
    T: Send + Sync + 'static,
{
    debug!(queue = %inner.name, "Maintenance loop started");
    loop {
        if inner.disposal.is_cancelled() {
            break;
        }

        let acquired = tokio::select! {
            () = inner.disposal.cancelled() => break,
            result = inner
                .lock
                .try_acquire(inner.keys.maintenance_lock(), MAINTENANCE_ACQUIRE_TIMEOUT) => result,
        };

        match acquired {
            Ok(Some(lease)) => {
                inner.maintenance_pass().await;
                if let Err(e) = inner.lock.release(&lease).await {
                    warn!(queue = %inner.name, error = %e, "Failed to release maintenance lock");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(queue = %inner.name, error = %e, "Maintenance lock acquisition failed");
                tokio::time::sleep(LOCK_ERROR_BACKOFF).await;
            }
        }
    }
    debug!(queue = %inner.name, "Maintenance loop stopped");
}

impl<T> QueueInner<T>
where
    T: Send + Sync + 'static,
{
    /// One three-sweep maintenance pass
    pub(crate) async fn maintenance_pass(&self) {
        if let Err(e) = self.timeout_in_flight_items().await {
            warn!(queue = %self.name, error = %e, "In-flight timeout sweep failed");
        }
        if let Err(e) = self.release_due_delayed_items().await {
            warn!(queue = %self.name, error = %e, "Delayed release sweep failed");
        }
        if let Err(e) = self.trim_dead_letter_overflow().await {
            warn!(queue = %self.name, error = %e, "Dead-letter trim failed");
        }
    }

    /// Abandon items whose in-flight lease expired
    async fn timeout_in_flight_items(&self) -> Result<(), ApplicationError> {
        let now = Utc::now();
        let timeout =
            chrono::Duration::from_std(self.config.work_item_timeout).unwrap_or(chrono::Duration::MAX);

        for raw in self.store.range(self.keys.in_flight_list()).await? {
            let Ok(id) = ItemId::parse(&raw) else {
                continue;
            };
            match self.store.get(&self.keys.dequeued_time(&id)).await {
                Ok(Some(bytes)) => {
                    let Some(dequeued_at) = decode_ticks(&bytes) else {
                        self.stamp_dequeued_time(&id).await;
                        continue;
                    };
                    if now - dequeued_at > timeout {
                        debug!(queue = %self.name, %id, "Lease expired, abandoning item");
                        match self.abandon(&id).await {
                            Ok(()) => {
                                self.counters.timeouts.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                warn!(
                                    queue = %self.name, %id, error = %e,
                                    "Failed to abandon timed-out item"
                                );
                            }
                        }
                    }
                }
                Ok(None) => {
                    // Missing stamp: repair it now, act on the next pass.
                    self.stamp_dequeued_time(&id).await;
                }
                Err(e) => {
                    warn!(queue = %self.name, %id, error = %e, "Failed to read dequeue time");
                }
            }
        }
        Ok(())
    }

    async fn stamp_dequeued_time(&self, id: &ItemId) {
        let result = self
            .store
            .set(
                &self.keys.dequeued_time(id),
                encode_ticks(Utc::now()),
                self.config.dequeued_time_ttl(),
            )
            .await;
        if let Err(e) = result {
            warn!(queue = %self.name, %id, error = %e, "Failed to stamp dequeue time");
        }
    }

    /// Move delayed items whose wait window elapsed back to ready
    async fn release_due_delayed_items(&self) -> Result<(), ApplicationError> {
        let now = Utc::now();
        for raw in self.store.range(self.keys.delayed_list()).await? {
            let Ok(id) = ItemId::parse(&raw) else {
                continue;
            };
            let due = match self.store.get(&self.keys.wait_time(&id)).await {
                Ok(Some(bytes)) => decode_ticks(&bytes).is_none_or(|until| until <= now),
                Ok(None) => true,
                Err(e) => {
                    warn!(queue = %self.name, %id, error = %e, "Failed to read wait time");
                    continue;
                }
            };
            if !due {
                continue;
            }

            let result = self
                .store
                .transaction(vec![
                    StoreCommand::RemoveFromList {
                        list: self.keys.delayed_list().to_string(),
                        value: id.as_str().to_string(),
                    },
                    StoreCommand::HeadPush {
                        list: self.keys.ready_list().to_string(),
                        value: id.as_str().to_string(),
                    },
                    StoreCommand::Delete {
                        key: self.keys.wait_time(&id),
                    },
                ])
                .await;
            match result {
                Ok(()) => {
                    if let Err(e) = self
                        .bus
                        .publish(self.keys.notification_channel(), id.as_str())
                        .await
                    {
                        warn!(queue = %self.name, %id, error = %e, "Failed to publish release");
                    }
                    debug!(queue = %self.name, %id, "Released delayed item");
                }
                Err(e) => {
                    warn!(queue = %self.name, %id, error = %e, "Failed to release delayed item");
                }
            }
        }
        Ok(())
    }

    /// Drop dead-letter entries beyond the configured bound
    async fn trim_dead_letter_overflow(&self) -> Result<(), ApplicationError> {
        let ids = self.store.range(self.keys.dead_list()).await?;
        if ids.len() <= self.config.dead_letter_max_items {
            return Ok(());
        }

        // The dead list is head-pushed, so everything past the bound is the
        // oldest tail of the list.
        for raw in &ids[self.config.dead_letter_max_items..] {
            let Ok(id) = ItemId::parse(raw) else {
                let _ = self.store.remove(self.keys.dead_list(), raw).await;
                continue;
            };
            let commands = vec![
                StoreCommand::Delete {
                    key: self.keys.payload(&id),
                },
                StoreCommand::Delete {
                    key: self.keys.attempts(&id),
                },
                StoreCommand::Delete {
                    key: self.keys.enqueued_time(&id),
                },
                StoreCommand::Delete {
                    key: self.keys.dequeued_time(&id),
                },
                StoreCommand::Delete {
                    key: self.keys.wait_time(&id),
                },
                StoreCommand::RemoveFromList {
                    list: self.keys.ready_list().to_string(),
                    value: id.as_str().to_string(),
                },
                StoreCommand::RemoveFromList {
                    list: self.keys.in_flight_list().to_string(),
                    value: id.as_str().to_string(),
                },
                StoreCommand::RemoveFromList {
                    list: self.keys.delayed_list().to_string(),
                    value: id.as_str().to_string(),
                },
                StoreCommand::RemoveFromList {
                    list: self.keys.dead_list().to_string(),
                    value: id.as_str().to_string(),
                },
            ];
            if let Err(e) = self.store.batch(commands).await {
                warn!(queue = %self.name, %id, error = %e, "Failed to trim dead-letter item");
            } else {
                debug!(queue = %self.name, %id, "Trimmed dead-letter overflow");
            }
        }
        Ok(())
    }
}
