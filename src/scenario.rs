use std::{future::Future, marker::PhantomData};

use typed_builder::TypedBuilder;

use crate::aggregate::Aggregate;

/// A named unit of work to be driven by an [`Executor`](crate::executor::Executor).
///
/// The `action` is invoked once per scheduled unit and must resolve to exactly
/// one metric. Heavy objects such as HTTP clients belong outside the closure;
/// clone a cheap handle inside it instead.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Scenario<A, F, Fut>
where
    A: Aggregate,
    F: Fn() -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send,
{
    #[builder(setter(into))]
    pub name: String,
    pub action: F,
    #[builder(default, setter(skip))]
    _marker: PhantomData<fn() -> (A, Fut)>,
}
