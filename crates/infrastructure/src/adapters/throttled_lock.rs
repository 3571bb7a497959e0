//! Throttled lock provider for single-process deployments
//!
//! Grants each lock name at most once per throttle interval. Acquisition
//! waits inside `try_acquire` until the next window opens, bounded by the
//! caller's acquire timeout, so a maintenance loop driven by this provider
//! gets its cadence from the lock rather than from its own sleeps.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use application::{ApplicationError, DistributedLockPort, LockLease};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Re-check interval while another holder has the lock
const HELD_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct LockState {
    held: bool,
    window_started_at: Option<Instant>,
}

enum Attempt {
    Granted(LockLease),
    Wait(Duration),
}

/// In-process implementation of [`DistributedLockPort`]
#[derive(Debug)]
pub struct ThrottledLockProvider {
    throttle: Duration,
    state: Mutex<HashMap<String, LockState>>,
}

impl ThrottledLockProvider {
    /// Create a provider granting each name once per `throttle`
    #[must_use]
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            state: Mutex::new(HashMap::new()),
        }
    }

    fn attempt(&self, name: &str) -> Attempt {
        let mut state = self.state.lock();
        let entry = state.entry(name.to_string()).or_default();
        if entry.held {
            return Attempt::Wait(HELD_POLL_INTERVAL);
        }
        let now = Instant::now();
        match entry.window_started_at {
            Some(started) if now.duration_since(started) < self.throttle => {
                Attempt::Wait(self.throttle - now.duration_since(started))
            }
            _ => {
                entry.held = true;
                entry.window_started_at = Some(now);
                Attempt::Granted(LockLease::new(name))
            }
        }
    }
}

#[async_trait]
impl DistributedLockPort for ThrottledLockProvider {
    async fn try_acquire(
        &self,
        name: &str,
        acquire_timeout: Duration,
    ) -> Result<Option<LockLease>, ApplicationError> {
        let deadline = Instant::now() + acquire_timeout;
        loop {
            let wait = match self.attempt(name) {
                Attempt::Granted(lease) => return Ok(Some(lease)),
                Attempt::Wait(wait) => wait,
            };
            if Instant::now() + wait > deadline {
                return Ok(None);
            }
            tokio::time::sleep(wait).await;
        }
    }

    async fn release(&self, lease: &LockLease) -> Result<(), ApplicationError> {
        if let Some(entry) = self.state.lock().get_mut(lease.name()) {
            entry.held = false;
        }
        Ok(())
    }
}
