//! Queue configuration and the retry-delay schedule

use std::time::Duration;

/// Maximum abandons before an item is dead-lettered (total attempts = retries + 1)
const DEFAULT_RETRIES: u32 = 2;

/// Base delay before a retry attempt
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Per-attempt delay multipliers; the last value clamps later attempts
const DEFAULT_RETRY_MULTIPLIERS: [u32; 4] = [1, 3, 5, 10];

/// In-flight lease before maintenance forces an abandon
const DEFAULT_WORK_ITEM_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// TTL applied to a payload when it enters the dead list
const DEFAULT_DEAD_LETTER_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Dead list is trimmed beyond this bound
const DEFAULT_DEAD_LETTER_MAX_ITEMS: usize = 100;

/// Payload records never expire sooner than this
const MIN_PAYLOAD_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Dequeue-time records never expire sooner than this
const MIN_DEQUEUED_TIME_TTL: Duration = Duration::from_secs(60 * 60);

/// Bounds for the maintenance throttle interval
const MIN_MAINTENANCE_THROTTLE: Duration = Duration::from_secs(1);
const MAX_MAINTENANCE_THROTTLE: Duration = Duration::from_secs(60);

/// Behavior configuration for one queue instance
///
/// Immutable after construction; every participant sharing a logical queue
/// must be constructed with the same values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Max abandons before dead-lettering
    pub retries: u32,
    /// Base retry delay; zero disables delayed retry entirely
    pub retry_delay: Duration,
    /// Per-attempt multipliers applied to `retry_delay`
    pub retry_multipliers: Vec<u32>,
    /// In-flight lease duration before automatic abandon
    pub work_item_timeout: Duration,
    /// TTL applied to payloads of dead-lettered items
    pub dead_letter_ttl: Duration,
    /// Upper bound on the dead-list length after maintenance
    pub dead_letter_max_items: usize,
    /// Whether this instance participates in maintenance
    pub run_maintenance_tasks: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            retry_multipliers: DEFAULT_RETRY_MULTIPLIERS.to_vec(),
            work_item_timeout: DEFAULT_WORK_ITEM_TIMEOUT,
            dead_letter_ttl: DEFAULT_DEAD_LETTER_TTL,
            dead_letter_max_items: DEFAULT_DEAD_LETTER_MAX_ITEMS,
            run_maintenance_tasks: true,
        }
    }
}

impl QueueConfig {
    /// Set the retry bound
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the base retry delay (zero disables delayed retry)
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the per-attempt multiplier table
    #[must_use]
    pub fn with_retry_multipliers(mut self, multipliers: Vec<u32>) -> Self {
        self.retry_multipliers = multipliers;
        self
    }

    /// Set the in-flight lease duration
    #[must_use]
    pub const fn with_work_item_timeout(mut self, timeout: Duration) -> Self {
        self.work_item_timeout = timeout;
        self
    }

    /// Set the dead-letter payload TTL
    #[must_use]
    pub const fn with_dead_letter_ttl(mut self, ttl: Duration) -> Self {
        self.dead_letter_ttl = ttl;
        self
    }

    /// Set the dead-list bound
    #[must_use]
    pub const fn with_dead_letter_max_items(mut self, max_items: usize) -> Self {
        self.dead_letter_max_items = max_items;
        self
    }

    /// Enable or disable maintenance participation for this instance
    #[must_use]
    pub const fn with_maintenance_tasks(mut self, enabled: bool) -> Self {
        self.run_maintenance_tasks = enabled;
        self
    }

    /// Delay before the given retry attempt (1-based)
    ///
    /// `retry_delay × multipliers[min(attempt, len) − 1]`; attempts past the
    /// end of the table reuse its last entry. Zero when the base delay is
    /// zero.
    #[must_use]
    pub fn retry_delay_for(&self, attempt: u32) -> Duration {
        if self.retry_delay.is_zero() {
            return Duration::ZERO;
        }
        let multipliers: &[u32] = if self.retry_multipliers.is_empty() {
            &[1]
        } else {
            &self.retry_multipliers
        };
        let len = u32::try_from(multipliers.len()).unwrap_or(u32::MAX);
        let index = (attempt.clamp(1, len) - 1) as usize;
        self.retry_delay * multipliers[index]
    }

    /// TTL applied to the payload and its sidecar records
    ///
    /// At least 1.5 times the total delay an item can spend retrying, and
    /// never below seven days.
    #[must_use]
    pub fn payload_ttl(&self) -> Duration {
        let total: Duration = (1..=self.retries.saturating_add(1))
            .map(|attempt| self.retry_delay_for(attempt))
            .sum();
        (total * 3 / 2).max(MIN_PAYLOAD_TTL)
    }

    /// TTL applied to dequeue-time records
    #[must_use]
    pub fn dequeued_time_ttl(&self) -> Duration {
        (self.work_item_timeout * 3 / 2).max(MIN_DEQUEUED_TIME_TTL)
    }

    /// Interval at which one participant may run a maintenance pass
    #[must_use]
    pub fn maintenance_throttle(&self) -> Duration {
        self.work_item_timeout
            .clamp(MIN_MAINTENANCE_THROTTLE, MAX_MAINTENANCE_THROTTLE)
    }
}
