//! Backend built from reqwest's defaults.

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWrite;

use super::error::RequestError;
use super::{Backend, Endpoints, Requester, http};

/// Requester using a client with library defaults: no explicit pool size and
/// no request timeout.
#[derive(Debug, Clone)]
pub struct StandardRequester {
    client: Client,
    endpoints: Endpoints,
}

impl StandardRequester {
    /// Builds the backend.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ClientBuild`] if the TLS backend or resolver
    /// cannot be initialised.
    pub fn new(endpoints: Endpoints) -> Result<Self, RequestError> {
        let client = Client::builder()
            .build()
            .map_err(|source| RequestError::ClientBuild { source })?;
        Ok(Self { client, endpoints })
    }
}

#[async_trait]
impl Requester for StandardRequester {
    fn backend(&self) -> Backend {
        Backend::Standard
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
