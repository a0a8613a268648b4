//! `thor` front end: argument handling, logging setup and the top-level run

pub mod args;

use std::sync::Arc;

use anyhow::Context;
use thor_client::HttpFetcher;
use thor_common::config::LoadConfig;
use thor_common::host::available_cores;
use thor_core::driver::{LoadDriver, RunSummary};
use thor_core::report::StdoutReporter;

pub async fn run(config: LoadConfig) -> anyhow::Result<RunSummary> {
    let fetcher = HttpFetcher::new(config.timeout).context("building HTTP client")?;
    let driver = LoadDriver::new(config, Arc::new(fetcher), Arc::new(StdoutReporter), available_cores())?;
    tracing::info!(target: "cli", "config: {:?}, workers: {}", driver.config(), driver.workers());
    let summary = driver.run().await.context("load run aborted")?;
    Ok(summary)
}

/// Logs go to stderr so stdout carries only the report.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
