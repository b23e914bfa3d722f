use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display},
    future::Future,
    time::Duration,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::aggregate::{Aggregate, HttpAggregate};

/// A [`Report`] is the processed form of a finished [`Aggregate`].
///
/// Reports derive the final figures (averages, ratios, rates) from raw
/// aggregated data and the run's wall-clock time. They are pure data: no I/O
/// happens here. Presenting a report is the job of a [`Reporter`].
pub trait Report
where
    Self: Send + Sync + Debug + Serialize + DeserializeOwned,
{
    type Aggregate: Aggregate;

    /// Build the report from the final aggregate and the total wall-clock
    /// time of the run.
    fn from_run(aggregate: Self::Aggregate, elapsed: Duration) -> Self;
}

/// A [`Reporter`] consumes a [`Report`] and performs side effects: printing it,
/// sending it to a service, or persisting it somewhere.
pub trait Reporter<R: Report> {
    fn report(
        &self,
        report: &R,
    ) -> impl Future<Output = Result<(), Box<dyn std::error::Error + Send + Sync>>>;
}

/// Final statistics of one HTTP load-test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpReport {
    /// Wall-clock time of the whole run, not the sum of request latencies.
    pub total_time: Duration,
    pub total_requests: usize,
    /// Requests answered with status 200.
    pub successful_requests: usize,
    /// Occurrences per observed status code.
    pub status_counts: BTreeMap<u16, usize>,
    /// Requests that produced no response.
    pub error_count: usize,
    pub avg_response_time: Duration,
    pub min_response_time: Duration,
    pub max_response_time: Duration,
}

impl Report for HttpReport {
    type Aggregate = HttpAggregate;

    fn from_run(aggregate: HttpAggregate, elapsed: Duration) -> Self {
        let avg_response_time = match u32::try_from(aggregate.count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => aggregate.total_latency / n,
            Err(_) => aggregate.total_latency.div_f64(aggregate.count as f64),
        };

        Self {
            total_time: elapsed,
            total_requests: aggregate.count,
            successful_requests: aggregate.success_count,
            status_counts: aggregate.status_counts,
            error_count: aggregate.error_count,
            avg_response_time,
            min_response_time: aggregate.min_latency.unwrap_or(Duration::ZERO),
            max_response_time: aggregate.max_latency,
        }
    }
}

impl HttpReport {
    /// Percentage of requests answered with status 200, `0.0` for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }

    /// Completed requests per wall-clock second, `0.0` when no time elapsed.
    pub fn requests_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.total_requests as f64 / secs
        } else {
            0.0
        }
    }

    /// Human-readable multi-line summary.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl Display for HttpReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "========== LOAD TEST REPORT ==========")?;
        writeln!(f, "Total time: {:?}", self.total_time)?;
        writeln!(f, "Total requests: {}", self.total_requests)?;
        writeln!(f, "Requests with status 200: {}", self.successful_requests)?;
        writeln!(f, "Success rate: {:.2}%", self.success_rate())?;
        if self.error_count > 0 {
            writeln!(f, "Connection/timeout errors: {}", self.error_count)?;
        }

        writeln!(f)?;
        writeln!(f, "Status code distribution:")?;
        for (status, count) in &self.status_counts {
            writeln!(f, "  Status {status}: {count} requests")?;
        }

        writeln!(f)?;
        writeln!(f, "Response times:")?;
        writeln!(f, "  Average: {:?}", self.avg_response_time)?;
        writeln!(f, "  Minimum: {:?}", self.min_response_time)?;
        writeln!(f, "  Maximum: {:?}", self.max_response_time)?;
        writeln!(f, "  Requests per second: {:.2}", self.requests_per_second())?;
        write!(f, "======================================")
    }
}

/// Prints the rendered text report to stdout.
pub struct StdoutReporter;

impl<R: Report + Display> Reporter<R> for StdoutReporter {
    async fn report(&self, report: &R) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("{report}");
        Ok(())
    }
}

/// Prints the report to stdout as a single JSON document.
pub struct JsonReporter;

impl<R: Report> Reporter<R> for JsonReporter {
    async fn report(&self, report: &R) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let value = serde_json::to_string_pretty(report)?;
        println!("{value}");
        Ok(())
    }
}
