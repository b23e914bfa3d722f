//! The request action: one timed HTTP GET against the target.
use std::time::{Duration, Instant};

use reqwest::Client;
use url::Url;

use crate::{config::LoadConfig, error::Result, metric::HttpMetric};

/// Performs single GET requests against a fixed target.
///
/// Cloning is cheap; clones share the underlying connection pool. Build one
/// `HttpAction` per run, never one per request.
#[derive(Debug, Clone)]
pub struct HttpAction {
    client: Client,
    url: Url,
}

impl HttpAction {
    /// `timeout` bounds each request from send to the end of the body.
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn from_config(config: &LoadConfig) -> Result<Self> {
        Self::new(config.url().clone(), config.timeout())
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send one request and time it, body included.
    ///
    /// Never fails: every error becomes an [`Outcome::Error`](crate::metric::Outcome)
    /// sample carrying the time spent until the failure.
    pub async fn execute(&self) -> HttpMetric {
        let start = Instant::now();

        let mut response = match self.client.get(self.url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return HttpMetric::error(describe(&e), start.elapsed()),
        };
        let status = response.status().as_u16();

        // Read the body to the end so the connection returns to the pool
        loop {
            match response.chunk().await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => return HttpMetric::error(describe(&e), start.elapsed()),
            }
        }

        HttpMetric::status(status, start.elapsed())
    }
}

fn describe(e: &reqwest::Error) -> String {
    let kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_builder() {
        "invalid request"
    } else if e.is_body() || e.is_decode() {
        "body read failed"
    } else if e.is_redirect() {
        "redirect failed"
    } else {
        "transport error"
    };
    format!("{kind}: {e}")
}
