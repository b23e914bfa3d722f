mod config;

use std::time::{Duration, Instant};

use anyhow::Context;
use barrage::{JsonReporter, LoadConfig, Reporter, StdoutReporter};
use clap::Parser;
use config::Config;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::parse();

    // logs
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let load = LoadConfig::new(&cfg.url, cfg.requests, cfg.concurrency)
        .context("invalid parameters")?
        .with_timeout(Duration::from_secs(cfg.timeout));

    if !cfg.json {
        print_params(&load);
    }

    tracing::info!(url = %load.url(), "Starting load test");
    let started = Instant::now();
    let report = barrage::run(&load, Duration::from_secs(cfg.deadline)).await?;
    tracing::info!("Load test finished in {:?}", started.elapsed());

    if cfg.json {
        JsonReporter.report(&report).await
    } else {
        StdoutReporter.report(&report).await
    }
    .map_err(|e| anyhow::anyhow!(e))
    .context("failed to write report")?;

    Ok(())
}

fn print_params(load: &LoadConfig) {
    println!("========== TEST PARAMETERS ==========");
    println!("URL: {}", load.url());
    println!("Total requests: {}", load.requests());
    println!("Concurrency: {}", load.concurrency());
    println!("Request timeout: {:?}", load.timeout());
    println!("=====================================");
    println!();
}
