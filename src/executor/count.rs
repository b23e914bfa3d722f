use std::{future::Future, time::Duration};

use tokio::{
    sync::{mpsc, watch},
    task::JoinSet,
    time::Instant,
};
use typed_builder::TypedBuilder;

use super::{Executor, Limiter};
use crate::{
    aggregate::{Aggregate, aggregator_task},
    config::RUN_DEADLINE,
    error::Error,
    metric::{Interruption, Metric},
    scenario::Scenario,
};

/// Upper bound on queued, not yet aggregated metrics.
const RESULT_BUFFER: usize = 1024;
/// Metrics folded per aggregator wakeup.
const BATCH_SIZE: usize = 256;

/// Executor that runs the scenario's action exactly `requests` times with at
/// most `concurrency` actions in flight.
///
/// - One Tokio task is spawned per request. Each waits on a shared [`Limiter`],
///   runs the action once and sends its metric to a single aggregator task.
/// - The limiter permit is held only around the action and is released on
///   every exit path.
/// - When `deadline` elapses, tasks still waiting for a permit record an
///   interrupted sample without running the action, and running actions are
///   dropped and recorded as interrupted.
///
/// The returned aggregate always holds exactly `requests` samples.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CountExecutor {
    /// How many times the action runs.
    pub requests: usize,
    /// Maximum number of actions in flight, clamped to `1..=requests`.
    pub concurrency: usize,
    /// Upper bound for the whole run.
    #[builder(default = RUN_DEADLINE)]
    pub deadline: Duration,
}

impl<A, F, Fut> Executor<A, F, Fut> for CountExecutor
where
    Self: Send + Sync + Sized,
    A: Aggregate + 'static,
    F: Fn() -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    type Error = Error;

    async fn exec(&self, scenario: &Scenario<A, F, Fut>) -> Result<A, Self::Error> {
        let limiter = Limiter::new(self.concurrency.min(self.requests));
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (results_tx, results_rx) = mpsc::channel(limiter.capacity().min(RESULT_BUFFER));

        let aggregator = tokio::spawn(aggregator_task::<A>(results_rx, BATCH_SIZE));

        tracing::info!(
            "Spawning {} request tasks, {} at a time...",
            self.requests,
            limiter.capacity()
        );
        let mut units = JoinSet::new();
        for id in 0..self.requests {
            units.spawn(run_unit(
                id,
                limiter.clone(),
                cancel_rx.clone(),
                scenario.action.clone(),
                results_tx.clone(),
            ));
        }

        tracing::info!("Running scenario: {}!", scenario.name);
        let deadline = tokio::time::sleep(self.deadline);
        tokio::pin!(deadline);

        let mut panicked = 0usize;
        loop {
            tokio::select! {
                joined = units.join_next() => match joined {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::error!("Request task failed without reporting: {e}");
                        panicked += 1;
                    }
                    None => break,
                },
                _ = &mut deadline, if !*cancel_tx.borrow() => {
                    tracing::warn!(
                        in_flight = limiter.in_flight(),
                        "Run deadline of {:?} exceeded, cancelling outstanding requests",
                        self.deadline
                    );
                    cancel_tx.send_replace(true);
                    limiter.close();
                }
            }
        }

        // Keep one sample per request even for tasks that died
        for _ in 0..panicked {
            let metric =
                <A::Metric as Metric>::interrupted(Duration::ZERO, Interruption::Panicked);
            if results_tx.send(metric).await.is_err() {
                tracing::error!("Aggregator gone, dropping stand-in sample");
            }
        }

        tracing::info!("All request tasks finished, closing result stream...");
        drop(results_tx);
        let agg = aggregator.await?;

        tracing::info!("Done running scenario: {}!", scenario.name);
        Ok(agg)
    }
}

/// One unit of work: wait for a slot, run the action once, report one metric.
async fn run_unit<M, F, Fut>(
    id: usize,
    limiter: Limiter,
    mut cancel: watch::Receiver<bool>,
    action: F,
    results: mpsc::Sender<M>,
) where
    M: Metric,
    F: Fn() -> Fut,
    Fut: Future<Output = M>,
{
    let metric = 'unit: {
        if *cancel.borrow() {
            break 'unit M::interrupted(Duration::ZERO, Interruption::Cancelled);
        }

        let permit = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => None,
            permit = limiter.acquire() => permit,
        };
        let Some(permit) = permit else {
            tracing::debug!("Request {id} cancelled before it started");
            break 'unit M::interrupted(Duration::ZERO, Interruption::Cancelled);
        };

        let start = Instant::now();
        let metric = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => {
                tracing::debug!("Request {id} cancelled in flight");
                M::interrupted(start.elapsed(), Interruption::Cancelled)
            }
            metric = action() => {
                tracing::debug!("Request {id} finished");
                metric
            }
        };
        permit.release();
        metric
    };

    if results.send(metric).await.is_err() {
        tracing::warn!("Request {id} finished after the aggregator stopped");
    }
}

/// Resolves once cancellation has been signalled.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // A dropped sender means the run is over without a cancellation.
    if rx.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}
