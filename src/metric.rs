use std::{fmt::Debug, time::Duration};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// The smallest unit produced by an action: one sample describing one unit of work.
///
/// Every unit of work an executor schedules yields exactly one metric. When the
/// action never gets to produce its own sample (the run was cancelled, or the
/// worker task died), the executor substitutes [`Metric::interrupted`] so the
/// number of samples always matches the number of scheduled units.
pub trait Metric
where
    Self: Serialize + DeserializeOwned + PartialOrd + PartialEq + Send + Sync + Debug + Clone,
{
    /// Sample standing in for a unit of work that did not complete on its own.
    fn interrupted(latency: Duration, cause: Interruption) -> Self;
}

/// Why a unit of work was cut short by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The run deadline fired before or during the action.
    Cancelled,
    /// The worker task panicked before emitting its sample.
    Panicked,
}

impl Interruption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interruption::Cancelled => "cancelled: run deadline exceeded",
            Interruption::Panicked => "worker task panicked",
        }
    }
}

/// How a single HTTP request attempt ended.
#[derive(Serialize, Deserialize, PartialOrd, PartialEq, Debug, Clone)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A response arrived, whatever its status code.
    Status(u16),
    /// No usable response: bad request, connect failure, timeout, transport
    /// error or cancellation.
    Error(String),
}

/// One request attempt and how long it took.
#[derive(Serialize, Deserialize, PartialOrd, PartialEq, Debug, Clone)]
pub struct HttpMetric {
    pub latency: Duration,
    pub outcome: Outcome,
}

impl HttpMetric {
    pub fn status(status: u16, latency: Duration) -> Self {
        Self {
            latency,
            outcome: Outcome::Status(status),
        }
    }

    pub fn error(message: impl Into<String>, latency: Duration) -> Self {
        Self {
            latency,
            outcome: Outcome::Error(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

impl Metric for HttpMetric {
    fn interrupted(latency: Duration, cause: Interruption) -> Self {
        Self::error(cause.as_str(), latency)
    }
}
