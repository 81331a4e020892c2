//! Validated run configuration.
//!
//! The CLI layer parses flags into a [`ScrapeConfig`]; everything downstream
//! consumes this struct instead of looking anything up globally.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::id::IdFormat;
use crate::requester::Backend;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 1024;

/// Default per-request timeout for the pooled backend.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between progress reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised while building a [`ScrapeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unknown identifier format name.
    #[error("invalid id format {value:?}: expected one of id5, id7, both")]
    InvalidIdFormat {
        /// The rejected value.
        value: String,
    },

    /// Worker count outside the accepted range.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The rejected value.
        value: usize,
    },

    /// A duration setting was zero.
    #[error("{name} must be greater than zero")]
    ZeroDuration {
        /// Setting name.
        name: &'static str,
    },

    /// Monitor bind address could not be parsed.
    #[error("invalid monitor bind address {value:?}")]
    InvalidBindAddress {
        /// The rejected value.
        value: String,
    },
}

/// Everything the scraper needs to run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Directory that receives one payload file per hit.
    pub output_dir: PathBuf,
    /// Identifier log path; `None` disables the log.
    pub id_list: Option<PathBuf>,
    /// Identifier lengths to generate.
    pub id_format: IdFormat,
    /// HTTP backend used by every worker.
    pub backend: Backend,
    /// Number of parallel workers.
    pub workers: usize,
    /// Per-request timeout (pooled backend only).
    pub timeout: Duration,
    /// Progress report interval.
    pub report_interval: Duration,
    /// Counter endpoint address; `None` disables it.
    pub monitor_bind: Option<SocketAddr>,
    /// Per-worker iteration bound; `None` runs until interrupted.
    pub max_iterations: Option<u64>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./images"),
            id_list: Some(PathBuf::from("./ids.txt")),
            id_format: IdFormat::Both,
            backend: Backend::Standard,
            workers: default_workers(),
            timeout: DEFAULT_TIMEOUT,
            report_interval: DEFAULT_REPORT_INTERVAL,
            monitor_bind: None,
            max_iterations: None,
        }
    }
}

impl ScrapeConfig {
    /// Checks invariants that flag parsing cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the worker count is out of range or a
    /// duration is zero.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::InvalidWorkers {
                value: self.workers,
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "timeout" });
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "report interval",
            });
        }
        debug!(
            workers = self.workers,
            backend = %self.backend,
            id_format = %self.id_format,
            "configuration validated"
        );
        Ok(self)
    }
}

/// One worker per logical CPU, clamped into the accepted range.
#[must_use]
pub fn default_workers() -> usize {
    num_cpus::get().clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Interprets an identifier-log flag value; empty disables the log.
#[must_use]
pub fn parse_id_list(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Interprets a monitor bind flag value.
///
/// `off` and the empty string disable the endpoint. A bare `:port` binds to
/// all interfaces.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBindAddress`] if the value is not a socket
/// address.
pub fn parse_monitor_bind(value: &str) -> Result<Option<SocketAddr>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    let candidate = if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    };
    candidate
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidBindAddress {
            value: value.to_string(),
        })
}
