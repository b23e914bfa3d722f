use clap::Parser;

/// Fire a fixed number of HTTP GET requests at a web service and report
/// latency and status-code statistics.
///
/// Example: barrage --url=http://localhost:3000 --requests=1000 --concurrency=10
#[derive(Parser, Debug, Clone)]
#[command(name = "barrage", version, about)]
pub struct Config {
    /// Target URL (required)
    #[arg(long, env = "BARRAGE_URL")]
    pub url: String,
    /// Total number of requests
    #[arg(long, env = "BARRAGE_REQUESTS", default_value_t = 100)]
    pub requests: usize,
    /// Number of simultaneous requests
    #[arg(long, env = "BARRAGE_CONCURRENCY", default_value_t = 10)]
    pub concurrency: usize,
    /// Per-request timeout in seconds
    #[arg(
        long,
        env = "BARRAGE_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,
    /// Upper bound for the whole run in seconds
    #[arg(
        long,
        env = "BARRAGE_DEADLINE",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub deadline: u64,
    /// Print the report as JSON instead of text
    #[arg(long, env = "BARRAGE_JSON")]
    pub json: bool,
}
