use thiserror::Error;

/// Failures that abort a run as a whole.
///
/// All but [`Error::Aggregator`] are raised before any request is sent.
/// Per-request failures are never reported through this type; they are
/// folded into the report as [`Outcome::Error`](crate::metric::Outcome) samples.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("number of requests must be greater than 0")]
    ZeroRequests,

    #[error("concurrency must be greater than 0")]
    ZeroConcurrency,

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("aggregator task failed: {0}")]
    Aggregator(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
