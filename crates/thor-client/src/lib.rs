//! HTTP seam for the load driver: one GET, status plus full body.

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool { self.status == 200 }
}

/// Failures below the HTTP status line: nothing usable came back.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status().as_u16();
        // the body is part of the measured request
        let body = resp.text().await?;
        tracing::trace!(target: "client", status, bytes = body.len(), "GET {}", url);
        Ok(FetchResponse { status, body })
    }
}

#[cfg(feature = "mock")]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted in-process fetcher; counts calls and peak concurrency.
    pub struct MockFetcher {
        status: u16,
        body: String,
        delay: Duration,
        fail_every: Option<usize>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl Default for MockFetcher {
        fn default() -> Self { Self::new() }
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self {
                status: 200,
                body: String::from("ok"),
                delay: Duration::ZERO,
                fail_every: None,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
            }
        }

        pub fn with_status(mut self, status: u16) -> Self { self.status = status; self }
        pub fn with_body(mut self, body: impl Into<String>) -> Self { self.body = body.into(); self }
        pub fn with_delay(mut self, delay: Duration) -> Self { self.delay = delay; self }

        /// Every `n`th call (1-based) fails with a connection error.
        pub fn failing_every(mut self, n: usize) -> Self { self.fail_every = Some(n.max(1)); self }

        pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
        pub fn peak_in_flight(&self) -> usize { self.peak_in_flight.load(Ordering::SeqCst) }
    }

    struct InFlight<'a>(&'a AtomicUsize);
    impl Drop for InFlight<'_> { fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); } }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = InFlight(&self.in_flight);
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if matches!(self.fail_every, Some(every) if n % every == 0) {
                return Err(FetchError::Connect(format!("mock refused {}", url)));
            }
            Ok(FetchResponse { status: self.status, body: self.body.clone() })
        }
    }
}
