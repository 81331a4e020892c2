//! Spawns the worker pool and the reporter, and waits for them to finish.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::reporter::Reporter;
use super::stats::StatsSnapshot;
use super::worker::Worker;
use super::ScrapeContext;
use crate::config::{MAX_WORKERS, MIN_WORKERS};
use crate::requester::{RequestError, Requester, RequesterConfig};

/// Error type for dispatcher setup.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The rejected value.
        value: usize,
    },

    /// The progress report interval was zero.
    #[error("report interval must be non-zero")]
    ZeroReportInterval,

    /// A worker's requester could not be built.
    #[error("failed to build requester for worker {worker}: {source}")]
    Requester {
        /// Index of the worker.
        worker: usize,
        /// The underlying error.
        #[source]
        source: RequestError,
    },
}

/// Runs N symmetric workers against a shared [`ScrapeContext`].
///
/// # Concurrency Model
///
/// - Each worker runs in its own Tokio task with a requester it owns
/// - Requesters are built up front so a broken backend fails before any work
/// - The reporter runs alongside and stops on the shutdown signal
/// - [`run`](Self::run) returns only after every worker task has exited
pub struct Dispatcher {
    ctx: Arc<ScrapeContext>,
    requesters: Vec<Box<dyn Requester>>,
    report_interval: Duration,
    max_iterations: Option<u64>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.requesters.len())
            .field("report_interval", &self.report_interval)
            .field("max_iterations", &self.max_iterations)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Builds one requester per worker from `requester_config`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidWorkers`] if `workers` is out of range,
    /// [`DispatchError::ZeroReportInterval`] if `report_interval` is zero and
    /// [`DispatchError::Requester`] if any requester fails to build.
    #[instrument(level = "debug", skip(ctx, requester_config), fields(backend = %requester_config.backend))]
    pub fn new(
        ctx: Arc<ScrapeContext>,
        requester_config: &RequesterConfig,
        workers: usize,
        report_interval: Duration,
    ) -> Result<Self, DispatchError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(DispatchError::InvalidWorkers { value: workers });
        }
        if report_interval.is_zero() {
            return Err(DispatchError::ZeroReportInterval);
        }

        let requesters = (0..workers)
            .map(|worker| {
                requester_config
                    .build()
                    .map_err(|source| DispatchError::Requester { worker, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(workers, "requesters built");
        Ok(Self {
            ctx,
            requesters,
            report_interval,
            max_iterations: None,
        })
    }

    /// Bounds the run: each worker stops after `limit` iterations, or earlier
    /// if the shutdown signal is raised.
    #[must_use]
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.max_iterations = Some(limit);
        self
    }

    /// Returns the number of workers that will be spawned.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.requesters.len()
    }

    /// Runs the pool to completion and returns the final counters.
    ///
    /// Worker panics are logged and do not abort the join.
    #[instrument(skip(self), fields(workers = self.requesters.len()))]
    pub async fn run(self) -> StatsSnapshot {
        let Self {
            ctx,
            requesters,
            report_interval,
            max_iterations,
        } = self;

        info!("starting workers");

        let reporter = Reporter::new(
            Arc::clone(&ctx.stats),
            ctx.shutdown.clone(),
            report_interval,
        );
        let reporter_handle = tokio::spawn(reporter.run());

        let handles: Vec<_> = requesters
            .into_iter()
            .enumerate()
            .map(|(index, requester)| {
                let worker = Worker::new(index, Arc::clone(&ctx), requester);
                tokio::spawn(worker.run(max_iterations))
            })
            .collect();

        let mut iterations = 0u64;
        for handle in handles {
            match handle.await {
                Ok(count) => iterations += count,
                Err(e) => warn!(error = %e, "worker task panicked"),
            }
        }

        // A bounded run can finish before anyone raises the signal.
        if !reporter_handle.is_finished() {
            reporter_handle.abort();
        }
        match reporter_handle.await {
            Err(e) if e.is_panic() => warn!(error = %e, "reporter task panicked"),
            _ => {}
        }

        let snapshot = ctx.stats.snapshot();
        info!(
            iterations,
            reqs = snapshot.reqs,
            done = snapshot.done,
            failed = snapshot.failed,
            "all workers stopped"
        );
        snapshot
    }
}
