//! The concurrent probe-and-fetch engine.
//!
//! # Overview
//!
//! A [`Dispatcher`] spawns N [`Worker`]s that share one [`ScrapeContext`].
//! Each worker loops: generate an identifier, probe it, and on a hit stream
//! the payload to `{output_dir}/{id}.jpg`, append the id to the
//! [`IdLog`] and bump the counters in [`ScrapeStats`]. A [`Reporter`] logs
//! throughput on a fixed interval. Everything stops cooperatively once the
//! [`ShutdownSignal`] is raised.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use idprobe_core::id::{IdFormat, IdGenerator};
//! use idprobe_core::requester::{Backend, RequesterConfig};
//! use idprobe_core::scrape::{Dispatcher, ScrapeContext, listen_for_interrupt};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = Arc::new(ScrapeContext::new("./images", IdGenerator::new(IdFormat::Both)));
//! tokio::spawn(listen_for_interrupt(ctx.shutdown.clone()));
//!
//! let requesters = RequesterConfig::new(Backend::Pooled, 8, Duration::from_secs(10));
//! let dispatcher = Dispatcher::new(Arc::clone(&ctx), &requesters, 8, Duration::from_secs(1))?;
//! let totals = dispatcher.run().await;
//! println!("found {} of {} requests", totals.done, totals.reqs);
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod id_log;
mod reporter;
mod shutdown;
mod stats;
mod worker;

pub use dispatcher::{DispatchError, Dispatcher};
pub use id_log::{IdLog, IdLogError};
pub use reporter::{Report, Reporter, ThroughputWindow};
pub use shutdown::{ShutdownSignal, listen_for_interrupt, raise_on};
pub use stats::{ScrapeStats, StatsSnapshot};
pub use worker::{Attempt, Worker};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::id::IdGenerator;
use crate::requester::PAYLOAD_EXTENSION;

/// State shared by every worker, the reporter and the monitor.
///
/// Built once at startup and handed out behind an `Arc`.
#[derive(Debug)]
pub struct ScrapeContext {
    /// Directory receiving payload files.
    pub output_dir: PathBuf,
    /// Candidate identifier source.
    pub generator: IdGenerator,
    /// Live counters.
    pub stats: Arc<ScrapeStats>,
    /// Identifier log, if enabled.
    pub id_log: Option<Arc<IdLog>>,
    /// Cancellation latch.
    pub shutdown: ShutdownSignal,
}

impl ScrapeContext {
    /// Creates a context with fresh counters, no identifier log and a lowered
    /// shutdown signal.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, generator: IdGenerator) -> Self {
        Self {
            output_dir: output_dir.into(),
            generator,
            stats: Arc::new(ScrapeStats::new()),
            id_log: None,
            shutdown: ShutdownSignal::new(),
        }
    }

    /// Enables the identifier log.
    #[must_use]
    pub fn with_id_log(mut self, id_log: Arc<IdLog>) -> Self {
        self.id_log = Some(id_log);
        self
    }

    /// Uses an existing shutdown signal.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Path the payload for `id` is written to.
    #[must_use]
    pub fn payload_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(format!("{id}.{PAYLOAD_EXTENSION}"))
    }

    /// Directory receiving payload files.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
