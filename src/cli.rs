//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use idprobe_core::config::{self, ConfigError, ScrapeConfig, default_workers};
use idprobe_core::{Backend, IdFormat};

/// Enumerate short image identifiers, probe for existence and fetch hits.
///
/// Runs until interrupted with Ctrl-C. Every identifier that exists is saved
/// as `<out-dir>/<id>.jpg` and appended to the identifier list.
#[derive(Parser, Debug)]
#[command(name = "idprobe")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory receiving downloaded images
    #[arg(long, default_value = "./images")]
    pub out_dir: PathBuf,

    /// File listing found identifiers, one per line (empty to disable)
    #[arg(long, default_value = "./ids.txt")]
    pub id_list: String,

    /// Identifier format to scrape (id5, id7, both)
    #[arg(long, default_value = "both")]
    pub id_format: IdFormat,

    /// Use the pooled backend (per-host connection budget and request timeout)
    #[arg(long)]
    pub pooled: bool,

    /// Number of workers running in parallel
    #[arg(short = 'w', long, default_value_t = default_worker_flag(), value_parser = clap::value_parser!(u16).range(1..=1024))]
    pub workers: u16,

    /// Request timeout in seconds (pooled backend)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Progress report interval in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..=3_600_000))]
    pub report_interval_ms: u64,

    /// Where to serve the counters endpoint (off to disable)
    #[arg(long, default_value = "127.0.0.1:6960")]
    pub monitor_bind: String,

    /// Stop each worker after this many identifiers instead of running until Ctrl-C
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_iterations: Option<u64>,
}

fn default_worker_flag() -> u16 {
    u16::try_from(default_workers()).unwrap_or(u16::MAX)
}

impl Args {
    /// Converts parsed flags into a validated run configuration.
    pub fn into_config(self) -> Result<ScrapeConfig, ConfigError> {
        ScrapeConfig {
            output_dir: self.out_dir,
            id_list: config::parse_id_list(&self.id_list),
            id_format: self.id_format,
            backend: if self.pooled {
                Backend::Pooled
            } else {
                Backend::Standard
            },
            workers: usize::from(self.workers),
            timeout: Duration::from_secs(self.timeout_secs),
            report_interval: Duration::from_millis(self.report_interval_ms),
            monitor_bind: config::parse_monitor_bind(&self.monitor_bind)?,
            max_iterations: self.max_iterations,
        }
        .validate()
    }
}
