//! Executor: orchestration of runtime execution and concurrency control
//!
//! The `Executor` trait is the runtime that executes a `Scenario`. Different
//! executors provide different execution strategies.
//!
//! Barrage provides [`CountExecutor`], which runs a scenario's action a fixed
//! number of times with a bounded number of actions in flight.
//!
//! # High-level flow
//! 1. A [`Limiter`] with the configured capacity is created.
//! 2. One aggregator task is spawned; it is the only consumer of the result
//!    channel and the only writer of the aggregate.
//! 3. Exactly `requests` unit tasks are spawned. Each one acquires a limiter
//!    permit, runs the action once, drops the permit and sends its metric.
//! 4. The executor joins every unit task, stands in a metric for any task that
//!    panicked, then drops its own sender. The channel closes once and the
//!    aggregator returns the final aggregate.
//!
//! # Cancellation
//! A run deadline is watched by every unit task. Units still waiting for a
//! permit when it fires give up without calling the action; units already in
//! flight have their action future dropped. Both record
//! [`Metric::interrupted`](crate::metric::Metric::interrupted) samples, so the
//! aggregate still holds exactly one sample per unit.
pub mod count;
pub mod limiter;

pub use count::CountExecutor;
pub use limiter::{Limiter, Permit};

use crate::{aggregate::Aggregate, scenario::Scenario};
use std::future::Future;

/// The runtime hook that executes a `Scenario`.
///
/// This trait is generic over the aggregate, action, and future types to remain
/// flexible and composable.
pub trait Executor<A, F, Fut>
where
    Self: Send + Sync + Sized,
    A: Aggregate,
    F: Fn() -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send,
{
    type Error;
    /// Execute the scenario and return the final aggregate.
    fn exec(
        &self,
        scenario: &Scenario<A, F, Fut>,
    ) -> impl Future<Output = Result<A, Self::Error>> + Send;
}
