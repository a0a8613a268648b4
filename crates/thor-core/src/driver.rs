use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thor_client::Fetcher;
use thor_common::config::{LoadConfig, TransportErrorPolicy};
use thor_common::{Result, ThorError};

use crate::report::{ReportEvent, Reporter};

/// Outcome of one simulated process: `requests` sequential GETs.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitResult {
    pub pid: usize,
    /// Mean elapsed seconds over this unit's requests.
    pub average: f64,
    pub requests: usize,
    pub status_errors: usize,
    pub transport_errors: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub workers: usize,
    /// Ordered by `pid`.
    pub units: Vec<UnitResult>,
    pub total_average: f64,
}

impl RunSummary {
    pub fn total_requests(&self) -> usize { self.units.iter().map(|u| u.requests).sum() }
}

#[derive(Default)]
struct WorkerOutcome {
    units: Vec<UnitResult>,
    errors: Vec<ThorError>,
}

pub struct LoadDriver {
    config: Arc<LoadConfig>,
    fetcher: Arc<dyn Fetcher>,
    reporter: Arc<dyn Reporter>,
    workers: usize,
}

impl LoadDriver {
    pub fn new(
        config: LoadConfig,
        fetcher: Arc<dyn Fetcher>,
        reporter: Arc<dyn Reporter>,
        available_cores: usize,
    ) -> Result<Self> {
        config.validate()?;
        let workers = config.worker_count(available_cores);
        Ok(Self { config: Arc::new(config), fetcher, reporter, workers })
    }

    pub fn workers(&self) -> usize { self.workers }

    pub fn config(&self) -> &LoadConfig { &self.config }

    /// Runs every unit on the pool and waits for all of them before aggregating.
    pub async fn run(&self) -> Result<RunSummary> {
        let processes = self.config.processes as usize;
        tracing::info!(target: "driver", processes, requests = self.config.requests, workers = self.workers, "starting load against {}", self.config.url);

        let next_pid = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let config = self.config.clone();
            let fetcher = self.fetcher.clone();
            let reporter = self.reporter.clone();
            let next_pid = next_pid.clone();
            handles.push(tokio::spawn(async move {
                worker_loop(worker_id, config, fetcher, reporter, next_pid).await
            }));
        }

        let mut units = Vec::with_capacity(processes);
        let mut first_error: Option<ThorError> = None;
        for handle in handles {
            match handle.await {
                Ok(outcome) => {
                    units.extend(outcome.units);
                    if first_error.is_none() {
                        first_error = outcome.errors.into_iter().next();
                    }
                }
                Err(e) => {
                    first_error.get_or_insert(ThorError::Worker(e.to_string()));
                }
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        units.sort_by_key(|u| u.pid);
        let total_average = grand_average(&units, processes);
        self.reporter.emit(&ReportEvent::Total { seconds: total_average });
        Ok(RunSummary { workers: self.workers, units, total_average })
    }
}

/// Sum of unit averages over the configured process count.
pub fn grand_average(units: &[UnitResult], processes: usize) -> f64 {
    if processes == 0 {
        return 0.0;
    }
    units.iter().map(|u| u.average).sum::<f64>() / processes as f64
}

async fn worker_loop(
    worker_id: usize,
    config: Arc<LoadConfig>,
    fetcher: Arc<dyn Fetcher>,
    reporter: Arc<dyn Reporter>,
    next_pid: Arc<AtomicUsize>,
) -> WorkerOutcome {
    let processes = config.processes as usize;
    let mut outcome = WorkerOutcome::default();
    loop {
        let pid = next_pid.fetch_add(1, Ordering::Relaxed);
        if pid >= processes {
            break;
        }
        tracing::debug!(target: "driver", worker_id, pid, "unit started");
        match run_unit(pid, &config, fetcher.as_ref(), reporter.as_ref()).await {
            Ok(unit) => outcome.units.push(unit),
            Err(e) => {
                tracing::error!(target: "driver", worker_id, pid, "unit aborted: {}", e);
                outcome.errors.push(e);
            }
        }
    }
    outcome
}

/// Issues `config.requests` GETs back to back and reports each one.
pub async fn run_unit(
    pid: usize,
    config: &LoadConfig,
    fetcher: &dyn Fetcher,
    reporter: &dyn Reporter,
) -> Result<UnitResult> {
    let requests = config.requests as usize;
    let mut elapsed_total = Duration::ZERO;
    let mut status_errors = 0;
    let mut transport_errors = 0;

    for request in 0..requests {
        let start = Instant::now();
        let fetched = fetcher.get(&config.url).await;
        let elapsed = start.elapsed();

        match fetched {
            Ok(resp) => {
                if !resp.is_ok() {
                    status_errors += 1;
                    tracing::warn!(target: "driver", pid, request, status = resp.status, "non-200 response");
                    reporter.emit(&ReportEvent::StatusError { pid, request, status: resp.status });
                }
                if config.verbose {
                    reporter.emit(&ReportEvent::Body { pid, body: &resp.body });
                }
            }
            Err(error) => {
                transport_errors += 1;
                tracing::warn!(target: "driver", pid, request, "transport failure: {}", error);
                reporter.emit(&ReportEvent::TransportError { pid, request, error: &error });
                if config.on_transport_error == TransportErrorPolicy::Abort {
                    return Err(ThorError::Transport { pid, request, message: error.to_string() });
                }
            }
        }

        reporter.emit(&ReportEvent::Request { pid, request, elapsed });
        elapsed_total += elapsed;
    }

    let average = elapsed_total.as_secs_f64() / requests.max(1) as f64;
    reporter.emit(&ReportEvent::Average { pid, seconds: average });
    Ok(UnitResult { pid, average, requests, status_errors, transport_errors })
}
