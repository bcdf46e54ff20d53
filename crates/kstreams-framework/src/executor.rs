//! Invocation executor.
//!
//! [`execute`] runs one handler against one record under a fresh
//! [`InvocationScope`]:
//!
//! 1. open the scope around the record;
//! 2. run the plan's distinct extractors concurrently;
//! 3. assemble the arguments in positional order;
//! 4. call the handler, unless an argument failed to resolve.
//!
//! The scope is dropped on every path, so nothing from one record survives
//! into the next.
//!
//! [`SolvedHandler`] pairs a handler with its plan and implements
//! `tower::Service<Arc<ConsumerRecord>>`, which is how the runtime holds
//! handlers.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use kstreams_core::ConsumerRecord;
use tower::util::BoxCloneSyncService;
use tower::{Service, ServiceExt};
use tracing::debug;

use crate::error::{BuildResult, ExtractError, ExtractResult};
use crate::handler::Handler;
use crate::plan::{Param, PlanBuilder, ResolutionPlan};
use crate::scope::InvocationScope;

/// Runs `handler` against `record` according to `plan`.
///
/// On success the handler's output is returned. If any argument fails to
/// resolve, the first failure in positional order is returned and the
/// handler body never runs.
pub async fn execute<H, T>(
    plan: &ResolutionPlan,
    handler: H,
    record: Arc<ConsumerRecord>,
) -> ExtractResult<H::Output>
where
    H: Handler<T>,
{
    let mut scope = InvocationScope::open(record);
    scope.resolve(plan.extractors()).await;

    let arguments = plan
        .parameters()
        .iter()
        .map(|parameter| {
            scope.argument_for(parameter).inspect_err(|err| {
                debug!(parameter = parameter.name(), error = %err, "Argument resolution failed");
            })
        })
        .collect::<ExtractResult<Vec<_>>>()?;

    handler.call(arguments).await
}

// ============================================================================
// SolvedHandler
// ============================================================================

/// A type-erased record service, as stored by the runtime.
pub type BoxedRecordService = BoxCloneSyncService<Arc<ConsumerRecord>, (), ExtractError>;

/// A handler together with its resolution plan.
///
/// The plan is built once in [`SolvedHandler::build`] and shared by every
/// clone and every invocation.
///
/// ```rust,ignore
/// use kstreams_framework::{FromHeader, Param, SolvedHandler};
///
/// async fn on_event(event_type: FromHeader<String>) -> String {
///     event_type.into_inner()
/// }
///
/// let solved = SolvedHandler::build(on_event, [Param::new("event_type")])?;
/// let output = solved.execute(record).await?;
/// ```
pub struct SolvedHandler<H, T> {
    handler: H,
    plan: Arc<ResolutionPlan>,
    _marker: PhantomData<fn() -> T>,
}

impl<H: Clone, T> Clone for SolvedHandler<H, T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            plan: Arc::clone(&self.plan),
            _marker: PhantomData,
        }
    }
}

impl<H, T> fmt::Debug for SolvedHandler<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolvedHandler")
            .field("handler", &std::any::type_name::<H>())
            .field("plan", &self.plan)
            .finish()
    }
}

impl<H, T> SolvedHandler<H, T>
where
    H: Handler<T>,
{
    /// Builds the plan for `handler` with the default [`PlanBuilder`].
    pub fn build(handler: H, params: impl IntoIterator<Item = Param>) -> BuildResult<Self> {
        Self::build_with(&PlanBuilder::new(), handler, params)
    }

    /// Builds the plan for `handler` with a custom builder.
    pub fn build_with(
        builder: &PlanBuilder,
        handler: H,
        params: impl IntoIterator<Item = Param>,
    ) -> BuildResult<Self> {
        let plan = builder.build::<H, T>(params)?;
        Ok(Self {
            handler,
            plan: Arc::new(plan),
            _marker: PhantomData,
        })
    }

    pub fn plan(&self) -> &Arc<ResolutionPlan> {
        &self.plan
    }

    /// Runs the handler against one record.
    pub async fn execute(&self, record: impl Into<Arc<ConsumerRecord>>) -> ExtractResult<H::Output> {
        execute(&self.plan, self.handler.clone(), record.into()).await
    }
}

impl<H, T> SolvedHandler<H, T>
where
    H: Handler<T>,
    T: Send + 'static,
{
    /// Erases the handler type, discarding its output.
    pub fn boxed(self) -> BoxedRecordService {
        BoxCloneSyncService::new(self.map_response(discard::<H::Output>))
    }
}

fn discard<R>(_: R) {}

impl<H, T> Service<Arc<ConsumerRecord>> for SolvedHandler<H, T>
where
    H: Handler<T>,
    T: Send + 'static,
{
    type Response = H::Output;
    type Error = ExtractError;
    type Future = BoxFuture<'static, ExtractResult<H::Output>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, record: Arc<ConsumerRecord>) -> Self::Future {
        let handler = self.handler.clone();
        let plan = Arc::clone(&self.plan);
        Box::pin(async move { execute(&plan, handler, record).await })
    }
}
