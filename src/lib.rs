//! Barrage: fire a fixed number of HTTP GET requests at a target, a bounded
//! number at a time, and report latency and status-code statistics.
//!
//! # Architecture
//!
//! The main building blocks are:
//!
//! - [`LoadConfig`]: validated parameters of a run (target, request count,
//!   concurrency, per-request timeout).
//! - [`HttpAction`]: performs one timed GET and turns every outcome, failures
//!   included, into a [`HttpMetric`].
//! - [`Scenario`]: binds a name to the action being measured.
//! - [`Executor`]: runs a scenario. [`CountExecutor`] spawns one task per
//!   request, gates them through a [`Limiter`] and enforces the run deadline.
//! - [`Aggregate`]: order-independent fold of metrics into running statistics,
//!   owned by a single aggregator task.
//! - [`Report`]: final figures derived from an aggregate; [`HttpReport`] renders
//!   the human-readable summary.
//! - [`Reporter`]: sends a report somewhere (stdout as text or JSON).
//!
//! # Example
//!
//! ```rust,no_run
//! use barrage::{LoadConfig, RUN_DEADLINE, Reporter, StdoutReporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = LoadConfig::new("http://localhost:3000", 1000, 10)?;
//!     let report = barrage::run(&config, RUN_DEADLINE).await?;
//!     StdoutReporter.report(&report).await
//! }
//! ```

/// The timed HTTP request
pub mod action;
/// Metric aggregators
pub mod aggregate;
/// Run parameters and their validation
pub mod config;
pub mod error;
/// Orchestrators that define how things will actually run
pub mod executor;
/// Single samples
pub mod metric;
/// Reports and Reporters
pub mod report;
/// Glue between an action and an executor
pub mod scenario;

use std::{sync::Arc, time::Duration};

use tokio::time::Instant;

pub use action::HttpAction;
pub use aggregate::{Aggregate, HttpAggregate};
pub use config::{LoadConfig, REQUEST_TIMEOUT, RUN_DEADLINE};
pub use error::{Error, Result};
pub use executor::{CountExecutor, Executor, Limiter};
pub use metric::{HttpMetric, Metric, Outcome};
pub use report::{HttpReport, JsonReporter, Report, Reporter, StdoutReporter};
pub use scenario::Scenario;

/// Run a complete load test and return its report.
///
/// Issues exactly `config.requests()` GET requests, at most
/// `config.concurrency()` at a time. Requests still outstanding when
/// `deadline` elapses are cancelled and counted as errors. Only setup
/// failures return `Err`; failed requests are part of the report.
pub async fn run(config: &LoadConfig, deadline: Duration) -> Result<HttpReport> {
    let action = Arc::new(HttpAction::from_config(config)?);
    let scenario = Scenario::<HttpAggregate, _, _>::builder()
        .name(config.url().as_str())
        .action(move || {
            let action = action.clone();
            async move { action.execute().await }
        })
        .build();
    let executor = CountExecutor::builder()
        .requests(config.requests())
        .concurrency(config.concurrency())
        .deadline(deadline)
        .build();

    let start = Instant::now();
    let aggregate = executor.exec(&scenario).await?;
    let elapsed = start.elapsed();

    Ok(HttpReport::from_run(aggregate, elapsed))
}
