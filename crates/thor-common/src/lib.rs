pub type Result<T> = core::result::Result<T, ThorError>;

#[derive(thiserror::Error, Debug)]
pub enum ThorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("process {pid}, request {request}: {message}")]
    Transport { pid: usize, request: usize, message: String },
    #[error("worker task failed: {0}")]
    Worker(String),
}

pub mod config {
    use std::time::Duration;

    use crate::{Result, ThorError};

    /// What a worker does when a GET fails below the HTTP layer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum TransportErrorPolicy {
        /// Report the failure, time it like any other request and keep going.
        #[default]
        Record,
        /// Stop the unit of work and fail the run once every unit has finished.
        Abort,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct LoadConfig {
        pub url: String,
        pub processes: u32,
        pub requests: u32,
        pub verbose: bool,
        /// Upper bound on concurrent workers; the host core count when unset.
        pub workers: Option<u32>,
        pub timeout: Option<Duration>,
        pub on_transport_error: TransportErrorPolicy,
    }

    impl LoadConfig {
        pub fn new(url: impl Into<String>) -> Self {
            Self {
                url: url.into(),
                processes: 1,
                requests: 1,
                verbose: false,
                workers: None,
                timeout: None,
                on_transport_error: TransportErrorPolicy::default(),
            }
        }

        pub fn validate(&self) -> Result<()> {
            if self.url.trim().is_empty() {
                return Err(ThorError::InvalidConfig("URL must not be empty".into()));
            }
            if self.processes == 0 {
                return Err(ThorError::InvalidConfig("process count must be positive".into()));
            }
            if self.requests == 0 {
                return Err(ThorError::InvalidConfig("request count must be positive".into()));
            }
            if self.workers == Some(0) {
                return Err(ThorError::InvalidConfig("worker cap must be positive".into()));
            }
            Ok(())
        }

        /// Size of the worker pool: `min(processes, cap)`, never below one.
        pub fn worker_count(&self, available_cores: usize) -> usize {
            let cap = self
                .workers
                .map(|w| w as usize)
                .unwrap_or(available_cores)
                .max(1);
            (self.processes as usize).min(cap).max(1)
        }
    }

}

pub mod host {
    use sysinfo::System;

    /// Logical CPUs visible to this process, at least one.
    pub fn available_cores() -> usize {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.cpus().len().max(1)
    }
}
