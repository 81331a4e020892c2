//! Periodic throughput reporting.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::ShutdownSignal;
use super::stats::{ScrapeStats, StatsSnapshot};

/// One progress line's worth of numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    /// Counters at sampling time.
    pub snapshot: StatsSnapshot,
    /// Hits per second over the last interval.
    pub current_rate: f64,
    /// Hits per second since the window started.
    pub average_rate: f64,
}

/// Remembers what the previous sample saw so deltas can be computed.
#[derive(Debug, Clone)]
pub struct ThroughputWindow {
    started: Instant,
    interval: Duration,
    last_done: u64,
}

impl ThroughputWindow {
    /// Starts a window at `started` sampled every `interval`.
    #[must_use]
    pub fn new(started: Instant, interval: Duration) -> Self {
        Self {
            started,
            interval,
            last_done: 0,
        }
    }

    /// Derives current and average hit rates from `snapshot` taken at `now`.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample(&mut self, snapshot: StatsSnapshot, now: Instant) -> Report {
        let delta = snapshot.done.saturating_sub(self.last_done);
        self.last_done = snapshot.done;

        let interval_secs = self.interval.as_secs_f64();
        let current_rate = if interval_secs > 0.0 {
            delta as f64 / interval_secs
        } else {
            0.0
        };

        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let average_rate = if elapsed > 0.0 {
            snapshot.done as f64 / elapsed
        } else {
            0.0
        };

        Report {
            snapshot,
            current_rate,
            average_rate,
        }
    }
}

/// Logs counters and rates every interval until shutdown.
#[derive(Debug)]
pub struct Reporter {
    stats: Arc<ScrapeStats>,
    shutdown: ShutdownSignal,
    interval: Duration,
}

impl Reporter {
    /// Creates a reporter over `stats`.
    #[must_use]
    pub fn new(stats: Arc<ScrapeStats>, shutdown: ShutdownSignal, interval: Duration) -> Self {
        Self {
            stats,
            shutdown,
            interval,
        }
    }

    /// Runs until the shutdown signal is raised.
    ///
    /// A zero interval disables reporting; the reporter returns immediately.
    pub async fn run(self) {
        if self.interval.is_zero() {
            warn!("report interval is zero, progress reporting disabled");
            return;
        }
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;

        let mut window = ThroughputWindow::new(Instant::now(), self.interval);
        loop {
            tokio::select! {
                () = self.shutdown.wait() => break,
                _ = ticker.tick() => {
                    let report = window.sample(self.stats.snapshot(), Instant::now());
                    log_report(&report);
                }
            }
        }
        debug!("reporter stopped");
    }
}

fn log_report(report: &Report) {
    info!(
        reqs = report.snapshot.reqs,
        done = report.snapshot.done,
        failed = report.snapshot.failed,
        current = %format_args!("{:.0} dl/s", report.current_rate),
        average = %format_args!("{:.0} dl/s", report.average_rate),
        "progress"
    );
}
