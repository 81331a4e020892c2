//! Existence probes and content fetches against the remote host.
//!
//! # Architecture
//!
//! - [`Requester`] - Async trait with the two operations every backend offers
//! - [`PooledRequester`] - Client with a per-host connection budget and timeout
//! - [`StandardRequester`] - Client with library defaults
//! - [`RequesterConfig`] - Picks and builds a backend once at startup
//!
//! Each worker owns its own requester; instances are never shared across
//! workers.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use idprobe_core::requester::{Backend, Endpoints, RequesterConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RequesterConfig::new(Backend::Pooled, 8, Duration::from_secs(10));
//! let requester = config.build()?;
//! if requester.exists("abcde").await? {
//!     let mut body = Vec::new();
//!     requester.stream_to("abcde", &mut body).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod constants;
mod error;
mod http;
mod pooled;
mod standard;

pub use constants::{CONTENT_BASE_URL, PAYLOAD_EXTENSION, PROBE_BASE_URL};
pub use error::RequestError;
pub use pooled::PooledRequester;
pub use standard::StandardRequester;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::config::ScrapeConfig;

/// Which HTTP backend the workers use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Explicit per-host connection budget and request timeout.
    Pooled,
    /// Library defaults.
    #[default]
    Standard,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pooled => "pooled",
            Self::Standard => "standard",
        })
    }
}

/// Base URLs the requester talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    probe_base: String,
    content_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(PROBE_BASE_URL, CONTENT_BASE_URL)
    }
}

impl Endpoints {
    /// Creates endpoints from explicit base URLs (trailing slashes ignored).
    #[must_use]
    pub fn new(probe_base: impl Into<String>, content_base: impl Into<String>) -> Self {
        Self {
            probe_base: trim_base(probe_base.into()),
            content_base: trim_base(content_base.into()),
        }
    }

    /// URL probed to decide whether `id` exists.
    #[must_use]
    pub fn probe_url(&self, id: &str) -> String {
        format!("{}/{id}", self.probe_base)
    }

    /// URL the payload for `id` is fetched from.
    #[must_use]
    pub fn content_url(&self, id: &str) -> String {
        format!("{}/{id}.{PAYLOAD_EXTENSION}", self.content_base)
    }
}

fn trim_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

/// Probe-and-fetch capability implemented by each backend.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Returns which backend this is.
    fn backend(&self) -> Backend;

    /// Returns `Ok(true)` on 200, `Ok(false)` on 404 and an error for any
    /// other status or transport failure.
    async fn exists(&self, id: &str) -> Result<bool, RequestError>;

    /// Streams the payload for `id` into `sink` and returns the bytes written.
    ///
    /// On a non-200 status nothing is written. On a mid-body failure the sink
    /// may hold a partial payload; cleaning it up is the caller's job.
    async fn stream_to(
        &self,
        id: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, RequestError>;
}

/// Backend selection plus the settings needed to build it.
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    /// Backend to build.
    pub backend: Backend,
    /// Idle connections kept per host (pooled backend).
    pub max_conns_per_host: usize,
    /// Request timeout (pooled backend).
    pub timeout: Duration,
    /// Remote base URLs.
    pub endpoints: Endpoints,
}

impl RequesterConfig {
    /// Creates a config targeting the default endpoints.
    #[must_use]
    pub fn new(backend: Backend, max_conns_per_host: usize, timeout: Duration) -> Self {
        Self {
            backend,
            max_conns_per_host,
            timeout,
            endpoints: Endpoints::default(),
        }
    }

    /// Derives the requester settings from a run configuration; the pool
    /// budget equals the worker count.
    #[must_use]
    pub fn from_scrape_config(config: &ScrapeConfig) -> Self {
        Self::new(config.backend, config.workers, config.timeout)
    }

    /// Replaces the endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Builds a fresh requester for one worker.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ClientBuild`] if the HTTP client cannot be built.
    pub fn build(&self) -> Result<Box<dyn Requester>, RequestError> {
        Ok(match self.backend {
            Backend::Pooled => Box::new(PooledRequester::new(
                self.endpoints.clone(),
                self.max_conns_per_host,
                self.timeout,
            )?),
            Backend::Standard => Box::new(StandardRequester::new(self.endpoints.clone())?),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints_use_imgur_templates() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.probe_url("abcde"), "https://imgur.com/abcde");
        assert_eq!(
            endpoints.content_url("abcde"),
            "https://i.imgur.com/abcde.jpg"
        );
    }

    #[test]
    fn test_endpoints_strip_trailing_slashes() {
        let endpoints = Endpoints::new("http://127.0.0.1:9000/", "http://127.0.0.1:9001//");
        assert_eq!(endpoints.probe_url("x"), "http://127.0.0.1:9000/x");
        assert_eq!(endpoints.content_url("x"), "http://127.0.0.1:9001/x.jpg");
    }

    #[test]
    fn test_build_selects_requested_backend() {
        let pooled = RequesterConfig::new(Backend::Pooled, 4, Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(pooled.backend(), Backend::Pooled);

        let standard = RequesterConfig::new(Backend::Standard, 4, Duration::from_secs(1))
            .build()
            .unwrap();
        assert_eq!(standard.backend(), Backend::Standard);
    }

    #[test]
    fn test_from_scrape_config_uses_worker_count_as_pool_budget() {
        let scrape = ScrapeConfig {
            workers: 12,
            backend: Backend::Pooled,
            timeout: Duration::from_secs(3),
            ..ScrapeConfig::default()
        };
        let config = RequesterConfig::from_scrape_config(&scrape);
        assert_eq!(config.max_conns_per_host, 12);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.backend, Backend::Pooled);
        assert_eq!(config.endpoints, Endpoints::default());
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Pooled.to_string(), "pooled");
        assert_eq!(Backend::default().to_string(), "standard");
    }
}
