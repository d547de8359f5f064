//! Public entry point of the resilience engine.
//!
//! `Executor::execute` is the one operation a host application calls: it
//! acquires a pooled context, resolves the `(endpoint, resource)` pipeline
//! from the [`Registry`], applies the caller-side 404/400 short-circuit
//! policy *inside* the action future (so a short-circuited call never
//! reaches retry, breaker, or fallback), runs the pipeline, and optionally
//! wraps it with a typed fallback when one was requested for this call.

mod context_pool;

pub use context_pool::ContextPool;

use resilience_core::{HttpMethod, OperationFault, PipelineFault};
use resilience_fallback::FallbackGenerator;
use resilience_registry::{EndpointConfigSource, PipelineKey, Registry};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fallback behaviour for one call. Absent entirely means no fallback is
/// composed for this execution: the classified fault propagates as-is,
/// matching §4.7: fallback wraps the composite only when requested.
pub struct FallbackOptions<T> {
    /// Whether `BrokenCircuit` / `IsolatedCircuit` / `TimeoutRejected`
    /// are substituted too, on top of the always-handled `Operation` faults.
    pub handle_execution_faults: bool,
    pub generator: Option<Arc<dyn FallbackGenerator<T>>>,
}

impl<T> FallbackOptions<T> {
    pub fn new(handle_execution_faults: bool) -> Self {
        Self {
            handle_execution_faults,
            generator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn FallbackGenerator<T>>) -> Self {
        self.generator = Some(generator);
        self
    }
}

/// Per-call options threaded through `Executor::execute`.
pub struct ExecuteOptions<T> {
    /// If `false` (the default), a 404 response is swallowed and the
    /// default value of `T` is returned instead of raising a fault.
    pub throw_if_not_found: bool,
    /// Invoked (for its side effect) when the action returns a 400; the
    /// call still resolves to the default value of `T`.
    pub on_bad_request: Option<Arc<dyn Fn() + Send + Sync>>,
    pub fallback: Option<FallbackOptions<T>>,
}

impl<T> Default for ExecuteOptions<T> {
    fn default() -> Self {
        Self {
            throw_if_not_found: false,
            on_bad_request: None,
            fallback: None,
        }
    }
}

impl<T> ExecuteOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn throw_if_not_found(mut self, throw: bool) -> Self {
        self.throw_if_not_found = throw;
        self
    }

    pub fn on_bad_request(mut self, callback: Arc<dyn Fn() + Send + Sync>) -> Self {
        self.on_bad_request = Some(callback);
        self
    }

    pub fn fallback(mut self, fallback: FallbackOptions<T>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Applies the caller-side 404/400 policy to one raw action outcome,
/// before it ever reaches the pipeline's own fault classification.
async fn short_circuited<T, Fut>(
    action: Fut,
    throw_if_not_found: bool,
    on_bad_request: Option<Arc<dyn Fn() + Send + Sync>>,
) -> Result<T, PipelineFault>
where
    T: Default,
    Fut: Future<Output = Result<T, PipelineFault>>,
{
    match action.await {
        Err(PipelineFault::Operation(OperationFault::Api { status: 404, .. })) if !throw_if_not_found => {
            Ok(T::default())
        }
        Err(PipelineFault::Operation(OperationFault::Api { status: 400, .. })) if on_bad_request.is_some() => {
            if let Some(callback) = &on_bad_request {
                callback();
            }
            Ok(T::default())
        }
        other => other,
    }
}

/// Binds a [`Registry`] to one named upstream endpoint and exposes the
/// single `execute` operation host handlers call.
pub struct Executor<S: EndpointConfigSource> {
    endpoint: String,
    registry: Arc<Registry<S>>,
    pool: ContextPool,
}

impl<S: EndpointConfigSource> Executor<S> {
    pub fn new(endpoint: impl Into<String>, registry: Arc<Registry<S>>) -> Self {
        Self {
            endpoint: endpoint.into(),
            registry,
            pool: ContextPool::new(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry<S>> {
        &self.registry
    }

    /// Runs `action` (a factory producing a fresh attempt each time the
    /// pipeline calls it) against `resource`, through the full resilience
    /// stack for this endpoint.
    pub async fn execute<T, F, Fut>(
        &self,
        rate_limit_partition: impl Into<String>,
        resource: impl Into<String>,
        method: HttpMethod,
        action: F,
        options: ExecuteOptions<T>,
        cancellation: CancellationToken,
    ) -> Result<T, PipelineFault>
    where
        T: Default + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PipelineFault>> + Send + 'static,
    {
        let resource = resource.into();
        let operation_key = format!("{}.{}", self.endpoint, resource);
        let handles_execution_faults = options.fallback.as_ref().map_or(false, |f| f.handle_execution_faults);

        let ctx = self.pool.acquire(operation_key, rate_limit_partition, resource.clone(), method, cancellation);

        let entry = self
            .registry
            .get_or_build(&PipelineKey::new(self.endpoint.clone(), resource, handles_execution_faults))
            .map_err(|err| PipelineFault::Operation(OperationFault::Unclassified(err.to_string())))?;

        let throw_if_not_found = options.throw_if_not_found;
        let on_bad_request = options.on_bad_request;
        let guarded_action = move || short_circuited(action(), throw_if_not_found, on_bad_request.clone());

        let pipeline_future = entry.pipeline.execute(&ctx, guarded_action);

        match options.fallback {
            Some(fallback) => entry.fallback.execute(&ctx, pipeline_future, fallback.generator.as_deref()).await,
            None => pipeline_future.await,
        }
    }
}
