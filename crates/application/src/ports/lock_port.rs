//! Port for the throttled distributed lock serializing maintenance
//!
//! Implementations grant a given lock name at most once per throttle
//! interval across every participant. All healthy participants keep trying;
//! whoever wins a window runs the work, everyone else skips.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use uuid::Uuid;

use crate::error::ApplicationError;

/// Proof of a held lock, passed back on release
#[derive(Debug, Clone)]
pub struct LockLease {
    name: String,
    lease_id: Uuid,
    acquired_at: DateTime<Utc>,
}

impl LockLease {
    /// Create a lease for a freshly acquired lock
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lease_id: Uuid::new_v4(),
            acquired_at: Utc::now(),
        }
    }

    /// The lock name this lease belongs to
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id distinguishing this grant from earlier ones
    #[must_use]
    pub const fn lease_id(&self) -> Uuid {
        self.lease_id
    }

    /// When the lock was granted
    #[must_use]
    pub const fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

/// Port for the distributed lock provider
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DistributedLockPort: Send + Sync {
    /// Attempt to take the named lock, waiting up to `acquire_timeout`
    ///
    /// Returns `None` when the lock is held elsewhere or its throttle window
    /// has already been consumed and will not reopen within the timeout.
    async fn try_acquire(
        &self,
        name: &str,
        acquire_timeout: Duration,
    ) -> Result<Option<LockLease>, ApplicationError>;

    /// Return a held lease
    async fn release(&self, lease: &LockLease) -> Result<(), ApplicationError>;
}
