use std::{collections::BTreeMap, fmt::Debug, time::Duration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::mpsc;

use crate::metric::{HttpMetric, Metric, Outcome};

/// The `Aggregate` trait defines how raw [`Metric`] values are collected and combined
/// into an intermediate, mergeable representation.
///
/// Aggregates store counters, sums and extrema. Derived values such as averages
/// and rates belong in a [`Report`](crate::report::Report), which is built from
/// a finished aggregate.
///
/// # Implementor notes
/// - `consume` must be order-independent: folding the same samples in any order
///   yields the same aggregate.
/// - `merge` must be **associative** and **commutative** so partial aggregates
///   can be combined in arbitrary order.
pub trait Aggregate
where
    Self: Serialize + DeserializeOwned + PartialOrd + PartialEq + Send + Sync + Debug + Clone,
{
    /// The metric type this aggregate summarizes.
    type Metric: Metric;

    /// Create a new, empty instance of the aggregate.
    fn new() -> Self;

    /// Aggregate multiple metrics into the current instance.
    fn aggregate(&mut self, metrics: &[Self::Metric]) {
        metrics.iter().for_each(|m| self.consume(m));
    }

    /// Incorporate a single metric into the aggregate.
    fn consume(&mut self, metric: &Self::Metric);

    /// Combine two different aggregates into one.
    fn merge(&mut self, other: Self);
}

/// Running statistics over [`HttpMetric`] samples.
#[derive(Serialize, Deserialize, PartialOrd, PartialEq, Debug, Clone, Default)]
pub struct HttpAggregate {
    /// Samples consumed, errors included.
    pub count: usize,
    /// Samples with status 200.
    pub success_count: usize,
    pub error_count: usize,
    /// Occurrences per observed status code.
    pub status_counts: BTreeMap<u16, usize>,
    pub total_latency: Duration,
    /// `None` until the first sample arrives.
    pub min_latency: Option<Duration>,
    pub max_latency: Duration,
}

impl Aggregate for HttpAggregate {
    type Metric = HttpMetric;

    fn new() -> Self {
        HttpAggregate::default()
    }

    fn consume(&mut self, metric: &Self::Metric) {
        self.count += 1;
        match metric.outcome {
            Outcome::Error(_) => self.error_count += 1,
            Outcome::Status(code) => {
                *self.status_counts.entry(code).or_insert(0) += 1;
                if code == 200 {
                    self.success_count += 1;
                }
            }
        }

        self.total_latency += metric.latency;
        self.min_latency = Some(match self.min_latency {
            Some(min) => min.min(metric.latency),
            None => metric.latency,
        });
        self.max_latency = self.max_latency.max(metric.latency);
    }

    fn merge(&mut self, other: Self) {
        self.count += other.count;
        self.success_count += other.success_count;
        self.error_count += other.error_count;
        for (code, n) in other.status_counts {
            *self.status_counts.entry(code).or_insert(0) += n;
        }
        self.total_latency += other.total_latency;
        self.min_latency = match (self.min_latency, other.min_latency) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_latency = self.max_latency.max(other.max_latency);
    }
}

/// Tokio task that folds every metric sent on `rx` into a single aggregate.
///
/// This is the only writer of the aggregate. It returns once every sender has
/// been dropped and the channel is drained.
pub async fn aggregator_task<A: Aggregate>(
    mut rx: mpsc::Receiver<A::Metric>,
    batch_size: usize,
) -> A {
    let mut agg = A::new();
    let mut batch = Vec::with_capacity(batch_size);

    // Blocks for the first metric, ends once all senders are gone
    while let Some(metric) = rx.recv().await {
        batch.push(metric);

        // Drain whatever is already queued without waiting
        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(metric) => batch.push(metric),
                Err(_) => break,
            }
        }

        agg.aggregate(&batch);
        batch.clear();
    }

    tracing::debug!("Result stream exhausted");
    agg
}
