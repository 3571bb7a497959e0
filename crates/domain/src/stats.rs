//! Point-in-time queue statistics

use serde::{Deserialize, Serialize};

/// Snapshot of queue state and cumulative counters
///
/// List lengths come from direct length queries and the counters from atomic
/// reads of in-process integers; the snapshot is not transactional across the
/// individual values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Ids awaiting dequeue
    pub ready: u64,
    /// Ids currently leased to a consumer
    pub in_flight: u64,
    /// Ids that exhausted their retries
    pub dead: u64,
    /// Cumulative successful enqueues by this instance
    pub enqueued: u64,
    /// Cumulative successful dequeues by this instance
    pub dequeued: u64,
    /// Cumulative completions by this instance
    pub completed: u64,
    /// Cumulative abandons by this instance
    pub abandoned: u64,
    /// Handler failures observed by the worker runloop
    pub worker_errors: u64,
    /// In-flight leases expired by maintenance
    pub timeouts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_zero() {
        let stats = QueueStats::default();
        assert_eq!(stats.ready, 0);
        assert_eq!(stats.enqueued, 0);
        assert_eq!(stats.timeouts, 0);
    }

    #[test]
    fn serializes_all_counters() {
        let stats = QueueStats {
            ready: 1,
            in_flight: 2,
            dead: 3,
            enqueued: 4,
            dequeued: 5,
            completed: 6,
            abandoned: 7,
            worker_errors: 8,
            timeouts: 9,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let parsed: QueueStats = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, stats);
    }
}
