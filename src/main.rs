//! CLI entry point for the idprobe tool.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use idprobe_core::scrape::listen_for_interrupt;
use idprobe_core::{Dispatcher, IdGenerator, IdLog, Monitor, RequesterConfig, ScrapeContext};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    let config = args.into_config()?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("failed to create output dir {}", config.output_dir.display()))?;

    let mut ctx = ScrapeContext::new(&config.output_dir, IdGenerator::new(config.id_format));
    if let Some(path) = &config.id_list {
        ctx = ctx.with_id_log(Arc::new(IdLog::open(path).await?));
    }
    let ctx = Arc::new(ctx);

    if let Some(addr) = config.monitor_bind {
        let monitor = Monitor::bind(addr).await?;
        let stats = Arc::clone(&ctx.stats);
        let shutdown = ctx.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = monitor.serve(stats, shutdown).await {
                warn!(error = %e, "monitor stopped");
            }
        });
    }

    tokio::spawn(listen_for_interrupt(ctx.shutdown.clone()));

    let mut dispatcher = Dispatcher::new(
        Arc::clone(&ctx),
        &RequesterConfig::from_scrape_config(&config),
        config.workers,
        config.report_interval,
    )?;
    if let Some(limit) = config.max_iterations {
        dispatcher = dispatcher.with_iteration_limit(limit);
    }

    info!(
        workers = dispatcher.workers(),
        backend = %config.backend,
        id_format = %config.id_format,
        out_dir = %config.output_dir.display(),
        "idprobe starting"
    );

    let totals = dispatcher.run().await;

    if let Some(log) = &ctx.id_log {
        log.flush().await?;
    }

    info!(
        reqs = totals.reqs,
        done = totals.done,
        failed = totals.failed,
        "run complete"
    );

    Ok(())
}
