//! Pooled backend with an explicit connection budget and timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWrite;
use tracing::debug;

use super::constants::default_user_agent;
use super::error::RequestError;
use super::{Backend, Endpoints, Requester, http};

/// Requester with a per-host pool budget whose requests (connect, send and
/// body) are bounded by `timeout`.
///
/// `max_conns_per_host` caps *idle* pooled connections; reqwest has no hard
/// limit on concurrent connections. Concurrency stays bounded because each
/// worker owns its own requester and issues one request at a time.
#[derive(Debug, Clone)]
pub struct PooledRequester {
    client: Client,
    endpoints: Endpoints,
}

impl PooledRequester {
    /// Builds the backend.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ClientBuild`] if the TLS backend or resolver
    /// cannot be initialised.
    pub fn new(
        endpoints: Endpoints,
        max_conns_per_host: usize,
        timeout: Duration,
    ) -> Result<Self, RequestError> {
        debug!(
            max_conns_per_host,
            timeout_ms = timeout.as_millis(),
            "building pooled requester"
        );
        let client = Client::builder()
            .pool_max_idle_per_host(max_conns_per_host)
            .connect_timeout(timeout)
            .timeout(timeout)
            .gzip(true)
            .user_agent(default_user_agent())
            .build()
            .map_err(|source| RequestError::ClientBuild { source })?;
        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl Requester for PooledRequester {
    fn backend(&self) -> Backend {
        Backend::Pooled
    }

    async fn exists(&self, id: &str) -> Result<bool, RequestError> {
        http::probe(&self.client, &self.endpoints.probe_url(id)).await
    }

    async fn stream_to(
        &self,
        id: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, RequestError> {
        http::fetch_into(&self.client, &self.endpoints.content_url(id), id, sink).await
    }
}
