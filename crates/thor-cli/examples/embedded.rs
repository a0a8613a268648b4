//! Drives the load driver in-process and prints the summary instead of the line report.
//!
//! cargo run -p thor-cli --example embedded -- http://127.0.0.1:8080/ 4 10

use std::sync::Arc;

use thor_client::HttpFetcher;
use thor_common::config::LoadConfig;
use thor_common::host::available_cores;
use thor_core::driver::LoadDriver;
use thor_core::report::CaptureReporter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut argv = std::env::args().skip(1);
    let mut config = LoadConfig::new(argv.next().unwrap_or_else(|| "http://127.0.0.1:8080/".into()));
    config.processes = argv.next().and_then(|v| v.parse().ok()).unwrap_or(4);
    config.requests = argv.next().and_then(|v| v.parse().ok()).unwrap_or(10);

    let capture = Arc::new(CaptureReporter::new());
    let driver = LoadDriver::new(config, Arc::new(HttpFetcher::new(None)?), capture.clone(), available_cores())?;
    let summary = driver.run().await?;

    let errors = capture.count_matching(|l| l.starts_with("Error."));
    println!(
        "{} requests on {} workers, {} errors, mean {:.4}s",
        summary.total_requests(),
        summary.workers,
        errors,
        summary.total_average
    );
    Ok(())
}
