//! Validated run configuration.
//!
//! A [`LoadConfig`] can only be obtained through [`LoadConfig::new`], so every
//! value that reaches the executor already satisfies the run's preconditions:
//! an absolute `http`/`https` URL, a positive request count and a concurrency
//! in `1..=requests`.
use std::time::Duration;

use tokio::sync::Semaphore;
use url::Url;

use crate::error::{Error, Result};

/// Upper bound for a single request, independent of the run deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound for a whole run.
pub const RUN_DEADLINE: Duration = Duration::from_secs(10 * 60);

/// Immutable parameters of a single load-test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    url: Url,
    requests: usize,
    concurrency: usize,
    timeout: Duration,
}

impl LoadConfig {
    /// Validate the raw parameters of a run.
    ///
    /// A `concurrency` greater than `requests` is clamped down to `requests`
    /// (with a warning); it is not an error.
    pub fn new(url: &str, requests: usize, concurrency: usize) -> Result<Self> {
        let url = parse_target(url)?;
        if requests == 0 {
            return Err(Error::ZeroRequests);
        }
        if concurrency == 0 {
            return Err(Error::ZeroConcurrency);
        }

        let mut effective = concurrency;
        if effective > requests {
            tracing::warn!(
                requested = concurrency,
                adjusted = requests,
                "Concurrency adjusted to the total number of requests"
            );
            effective = requests;
        }
        // The semaphore panics above this many permits.
        if effective > Semaphore::MAX_PERMITS {
            tracing::warn!(
                requested = effective,
                adjusted = Semaphore::MAX_PERMITS,
                "Concurrency capped to the limiter capacity"
            );
            effective = Semaphore::MAX_PERMITS;
        }

        Ok(Self {
            url,
            requests,
            concurrency: effective,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout. A zero duration keeps the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = timeout;
        }
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Effective concurrency, already clamped to `requests`.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|source| Error::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::UnsupportedScheme(other.to_string())),
    }
}
