//! idprobe Core Library
//!
//! This library provides the core functionality for the idprobe tool, which
//! enumerates random short identifiers, probes a remote image host for each
//! one, and downloads every hit.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Validated run configuration
//! - [`id`] - Candidate identifier generation
//! - [`requester`] - Existence probes and content fetches (two HTTP backends)
//! - [`scrape`] - Worker pool, counters, reporter, identifier log, shutdown
//! - [`monitor`] - HTTP endpoint exposing the counters

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod id;
pub mod monitor;
pub mod requester;
pub mod scrape;

// Re-export commonly used types
pub use config::{ConfigError, ScrapeConfig};
pub use id::{IdFormat, IdGenerator};
pub use monitor::{Monitor, MonitorError};
pub use requester::{Backend, Endpoints, RequestError, Requester, RequesterConfig};
pub use scrape::{
    Attempt, DispatchError, Dispatcher, IdLog, ScrapeContext, ScrapeStats, ShutdownSignal,
    StatsSnapshot,
};
