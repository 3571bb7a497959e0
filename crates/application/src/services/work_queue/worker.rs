//! Worker runloop
//!
//! Pulls one entry at a time and hands it to the user handler. Handler
//! outcomes settle the entry; the loop itself never mutates queue state
//! beyond complete/abandon. Handlers run in their own task so a panic is
//! contained and treated like any other handler failure.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::{QueueEntry, QueueInner};

/// Error type handlers may return; any error abandons the entry
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// How often the runloop surfaces from an idle dequeue to re-check cancellation
const WORKER_DEQUEUE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause after a failed dequeue before the loop retries
const DEQUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Handle to the spawned runloop, held by the owning queue
pub(crate) struct WorkerHandle {
    pub(crate) cancel: CancellationToken,
    pub(crate) join: JoinHandle<()>,
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

pub(crate) async fn run_loop<T, F, Fut>(
    inner: Arc<QueueInner<T>>,
    handler: F,
    auto_complete: bool,
    cancel: CancellationToken,
) where
    T: Send + Sync + 'static,
    F: Fn(QueueEntry<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    debug!(queue = %inner.name, "Worker runloop started");
    loop {
        if cancel.is_cancelled() || inner.disposal.is_cancelled() {
            break;
        }

        let entry = match QueueInner::dequeue(
            &inner,
            Some(WORKER_DEQUEUE_TIMEOUT),
            Some(cancel.clone()),
        )
        .await
        {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(e) => {
                warn!(queue = %inner.name, error = %e, "Dequeue failed in worker runloop");
                tokio::time::sleep(DEQUEUE_ERROR_BACKOFF).await;
                continue;
            }
        };

        let id = entry.id().clone();
        let settlement = entry.settlement();

        match tokio::spawn(handler(entry)).await {
            Ok(Ok(())) => {
                if auto_complete && !settlement.is_settled() {
                    if let Err(e) = inner.complete(&id).await {
                        warn!(queue = %inner.name, %id, error = %e, "Auto-complete failed");
                    }
                }
            }
            Ok(Err(e)) => {
                inner.counters.worker_errors.fetch_add(1, Ordering::Relaxed);
                error!(queue = %inner.name, %id, error = %e, "Handler failed, abandoning entry");
                abandon_unsettled(&inner, &id, settlement.is_settled()).await;
            }
            Err(join_error) => {
                inner.counters.worker_errors.fetch_add(1, Ordering::Relaxed);
                error!(
                    queue = %inner.name, %id, error = %join_error,
                    "Handler task aborted, abandoning entry"
                );
                abandon_unsettled(&inner, &id, settlement.is_settled()).await;
            }
        }
    }
    debug!(queue = %inner.name, "Worker runloop stopped");
}

async fn abandon_unsettled<T>(inner: &Arc<QueueInner<T>>, id: &domain::ItemId, settled: bool)
where
    T: Send + Sync + 'static,
{
    if settled {
        return;
    }
    if let Err(e) = inner.abandon(id).await {
        warn!(queue = %inner.name, %id, error = %e, "Failed to abandon entry after handler error");
    }
}
