use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use thor_client::FetchError;

/// One line (or block, for bodies) of operator-facing output.
#[derive(Debug)]
pub enum ReportEvent<'a> {
    Request { pid: usize, request: usize, elapsed: Duration },
    Body { pid: usize, body: &'a str },
    StatusError { pid: usize, request: usize, status: u16 },
    TransportError { pid: usize, request: usize, error: &'a FetchError },
    Average { pid: usize, seconds: f64 },
    Total { seconds: f64 },
}

impl fmt::Display for ReportEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportEvent::Request { pid, request, elapsed } => write!(
                f,
                "Process: {}, Request: {}, Elapsed Time: {:.2}",
                pid,
                request,
                elapsed.as_secs_f64()
            ),
            ReportEvent::Body { body, .. } => f.write_str(body),
            ReportEvent::StatusError { pid, request, status } => write!(
                f,
                "Error. Problem with request: process {}, request {} returned status {}",
                pid, request, status
            ),
            ReportEvent::TransportError { pid, request, error } => write!(
                f,
                "Error. Problem with request: process {}, request {} failed: {}",
                pid, request, error
            ),
            ReportEvent::Average { pid, seconds } => {
                write!(f, "Process: {}, AVERAGE   , Elapsed Time: {:.2}", pid, seconds)
            }
            ReportEvent::Total { seconds } => write!(f, "TOTAL AVERAGE ELAPSED TIME: {:.2}", seconds),
        }
    }
}

pub trait Reporter: Send + Sync {
    fn emit(&self, event: &ReportEvent<'_>);
}

/// Writes each event as one whole line; lines from different units may interleave.
#[derive(Default)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn emit(&self, event: &ReportEvent<'_>) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", event) {
            tracing::debug!(target: "report", "stdout write failed: {}", e);
        }
    }
}

/// Keeps rendered lines in memory.
#[derive(Default)]
pub struct CaptureReporter {
    lines: Mutex<Vec<String>>,
}

impl CaptureReporter {
    pub fn new() -> Self { Self::default() }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn count_matching(&self, pred: impl Fn(&str) -> bool) -> usize {
        self.lines().iter().filter(|l| pred(l)).count()
    }
}

impl Reporter for CaptureReporter {
    fn emit(&self, event: &ReportEvent<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(event.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_use_two_decimal_seconds() {
        let req = ReportEvent::Request { pid: 3, request: 1, elapsed: Duration::from_millis(250) };
        assert_eq!(req.to_string(), "Process: 3, Request: 1, Elapsed Time: 0.25");

        let avg = ReportEvent::Average { pid: 0, seconds: 1.5 };
        assert_eq!(avg.to_string(), "Process: 0, AVERAGE   , Elapsed Time: 1.50");

        let total = ReportEvent::Total { seconds: 0.004 };
        assert_eq!(total.to_string(), "TOTAL AVERAGE ELAPSED TIME: 0.00");
    }

    #[test]
    fn error_notices_are_marked() {
        let status = ReportEvent::StatusError { pid: 1, request: 2, status: 503 };
        assert!(status.to_string().starts_with("Error."));
        assert!(status.to_string().contains("503"));

        let err = FetchError::Connect("refused".into());
        let transport = ReportEvent::TransportError { pid: 0, request: 0, error: &err };
        assert!(transport.to_string().starts_with("Error."));
        assert!(transport.to_string().contains("refused"));
    }

    #[test]
    fn capture_keeps_emission_order() {
        let capture = CaptureReporter::new();
        capture.emit(&ReportEvent::Body { pid: 0, body: "first" });
        capture.emit(&ReportEvent::Total { seconds: 2.0 });
        assert_eq!(capture.lines(), vec!["first".to_string(), "TOTAL AVERAGE ELAPSED TIME: 2.00".to_string()]);
        assert_eq!(capture.count_matching(|l| l.starts_with("TOTAL")), 1);
    }
}
