//! Per-worker probe-and-fetch loop.

use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tracing::{debug, instrument, warn};

use super::ScrapeContext;
use crate::requester::Requester;

/// What happened to one candidate identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// The probe answered not-found.
    Missing,
    /// The probe itself failed; nothing else was attempted.
    ProbeFailed,
    /// The identifier exists. `payload_saved` is false if the payload could
    /// not be written or fetched; the hit is recorded either way.
    Found {
        /// Whether the payload file holds the full body.
        payload_saved: bool,
    },
}

/// One worker: a requester it owns plus a handle to the shared context.
pub struct Worker {
    index: usize,
    ctx: Arc<ScrapeContext>,
    requester: Box<dyn Requester>,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("index", &self.index)
            .field("backend", &self.requester.backend())
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Creates a worker bound to `requester` for its whole lifetime.
    #[must_use]
    pub fn new(index: usize, ctx: Arc<ScrapeContext>, requester: Box<dyn Requester>) -> Self {
        Self {
            index,
            ctx,
            requester,
        }
    }

    /// Loops until the shutdown signal is raised or, for a bounded run,
    /// `max_iterations` is reached. Returns the number of iterations run.
    ///
    /// The signal is checked once per iteration; a request already in flight
    /// completes before the worker notices it.
    #[instrument(skip(self), fields(worker = self.index, backend = %self.requester.backend()))]
    pub async fn run(self, max_iterations: Option<u64>) -> u64 {
        debug!("worker started");
        let mut iterations = 0u64;

        while !self.ctx.shutdown.is_raised() {
            if max_iterations.is_some_and(|max| iterations >= max) {
                break;
            }
            let id = self.ctx.generator.next_id();
            self.attempt(&id).await;
            iterations += 1;
        }

        debug!(iterations, "worker stopped");
        iterations
    }

    /// Probes `id` and, on a hit, fetches and records it.
    ///
    /// Errors never escape: they are counted, logged and folded into the
    /// returned [`Attempt`].
    pub async fn attempt(&self, id: &str) -> Attempt {
        let stats = &self.ctx.stats;

        let probe = self.requester.exists(id).await;
        stats.record_request();
        match probe {
            Ok(true) => {}
            Ok(false) => return Attempt::Missing,
            Err(e) => {
                stats.record_failure();
                warn!(id, error = %e, "existence probe failed");
                return Attempt::ProbeFailed;
            }
        }

        let payload_saved = self.save_payload(id).await;
        self.record_hit(id).await;
        Attempt::Found { payload_saved }
    }

    async fn save_payload(&self, id: &str) -> bool {
        let stats = &self.ctx.stats;
        let path = self.ctx.payload_path(id);

        let mut file = match File::create(&path).await {
            Ok(file) => file,
            Err(e) => {
                stats.record_failure();
                warn!(id, path = %path.display(), error = %e, "failed to create payload file");
                return false;
            }
        };

        let result = self.requester.stream_to(id, &mut file).await;
        stats.record_request();
        drop(file);

        match result {
            Ok(bytes) => {
                debug!(id, bytes, path = %path.display(), "payload saved");
                true
            }
            Err(e) => {
                stats.record_failure();
                warn!(id, error = %e, "failed to fetch payload");
                remove_partial(&path).await;
                false
            }
        }
    }

    async fn record_hit(&self, id: &str) {
        if let Some(log) = &self.ctx.id_log
            && let Err(e) = log.append(id).await
        {
            warn!(id, error = %e, "failed to append to identifier log");
        }
        self.ctx.stats.record_done();
    }
}

async fn remove_partial(path: &Path) {
    debug!(path = %path.display(), "cleaning up partial payload after error");
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "partial payload cleanup failed");
    }
}
