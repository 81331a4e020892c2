//! Live run counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every worker, the reporter and the monitor.
///
/// All three only ever grow. Updates are single atomic increments so workers
/// never block each other, and reads never block writers.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    reqs: AtomicU64,
    done: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`ScrapeStats`].
///
/// Serializes with the field names external tooling scrapes: `reqs`, `done`,
/// `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests issued (probes plus fetches).
    pub reqs: u64,
    /// Identifiers confirmed to exist.
    pub done: u64,
    /// Failed requests and failed local writes.
    pub failed: u64,
}

impl ScrapeStats {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of requests issued.
    #[must_use]
    pub fn reqs(&self) -> u64 {
        self.reqs.load(Ordering::SeqCst)
    }

    /// Returns the number of identifiers confirmed to exist.
    #[must_use]
    pub fn done(&self) -> u64 {
        self.done.load(Ordering::SeqCst)
    }

    /// Returns the number of failures.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Reads all three counters.
    ///
    /// Each counter is read atomically; the three reads are not a single
    /// transaction, which is fine for monotonic counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reqs: self.reqs(),
            done: self.done(),
            failed: self.failed(),
        }
    }

    pub(crate) fn record_request(&self) {
        self.reqs.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = ScrapeStats::default();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_stats_increment() {
        let stats = ScrapeStats::new();

        stats.record_request();
        stats.record_request();
        stats.record_request();
        stats.record_done();
        stats.record_failure();

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                reqs: 3,
                done: 1,
                failed: 1
            }
        );
    }

    #[test]
    fn test_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(ScrapeStats::new());
        let mut handles = Vec::new();

        for _ in 0..10 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.record_request();
                    stats.record_done();
                    stats.record_failure();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.reqs(), 1000);
        assert_eq!(stats.done(), 1000);
        assert_eq!(stats.failed(), 1000);
    }

    #[test]
    fn test_snapshot_serializes_with_scrape_names() {
        let snapshot = StatsSnapshot {
            reqs: 10,
            done: 2,
            failed: 1,
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json, serde_json::json!({"reqs": 10, "done": 2, "failed": 1}));
    }
}
