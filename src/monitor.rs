//! HTTP endpoint exposing the live counters.
//!
//! `GET /debug/vars` returns the current [`StatsSnapshot`] as JSON so
//! external tooling can scrape `reqs`, `done` and `failed`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::scrape::{ScrapeStats, ShutdownSignal, StatsSnapshot};

/// Path the counters are served on.
pub const VARS_PATH: &str = "/debug/vars";

/// Errors from the monitor endpoint.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The listener could not be bound.
    #[error("failed to bind monitor on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an error.
    #[error("monitor server error: {source}")]
    Serve {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// A bound, not yet serving, monitor endpoint.
#[derive(Debug)]
pub struct Monitor {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Monitor {
    /// Binds the listener. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr) -> Result<Self, MonitorError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| MonitorError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| MonitorError::Bind { addr, source })?;
        debug!(%local_addr, "monitor bound");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves until `shutdown` is raised.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Serve`] if the server fails.
    pub async fn serve(
        self,
        stats: Arc<ScrapeStats>,
        shutdown: ShutdownSignal,
    ) -> Result<(), MonitorError> {
        info!(addr = %self.local_addr, path = VARS_PATH, "monitor listening");
        axum::serve(self.listener, router(stats))
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await
            .map_err(|source| MonitorError::Serve { source })
    }
}

/// Routes for the monitor endpoint.
#[must_use]
pub fn router(stats: Arc<ScrapeStats>) -> Router {
    Router::new()
        .route(VARS_PATH, get(vars))
        .with_state(stats)
}

async fn vars(State(stats): State<Arc<ScrapeStats>>) -> Json<StatsSnapshot> {
    Json(stats.snapshot())
}
