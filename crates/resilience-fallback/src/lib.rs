//! Typed fallback strategy.
//!
//! Wraps the entire composite pipeline (retry, circuit breaker, timeout,
//! rate limiter) and substitutes a default value for classified faults.
//! Unlike every other strategy in this workspace, fallback is generic over
//! the result type `T`; the pipeline it wraps is not (see the crate-level
//! design notes on the typed vs. untyped registry families), so this is
//! the one seam where `T` enters.

mod events;

pub use events::FallbackEvent;

use resilience_core::{EventListeners, PipelineFault, ResilienceContext};
use std::future::Future;
use std::time::Instant;

/// `true` iff this fault should be replaced with a fallback value rather
/// than propagated to the caller.
///
/// `RateLimitRejected` is never handled here (Invariant 5 / §4.6): a
/// rejected admission must surface so the caller can map it to HTTP 429,
/// regardless of `handle_execution_faults`.
pub fn should_handle(fault: &PipelineFault, handle_execution_faults: bool) -> bool {
    match fault {
        PipelineFault::Operation(_) => true,
        PipelineFault::RateLimitRejected => false,
        PipelineFault::BrokenCircuit | PipelineFault::IsolatedCircuit | PipelineFault::TimeoutRejected => {
            handle_execution_faults
        }
    }
}

/// Produces the substitute value for a handled fault. Boxed so the
/// executor can pass a per-call closure without the pipeline needing to
/// be generic over a concrete generator type.
pub trait FallbackGenerator<T>: Send + Sync {
    fn generate(&self, fault: &PipelineFault) -> T;
}

impl<T, F> FallbackGenerator<T> for F
where
    F: Fn(&PipelineFault) -> T + Send + Sync,
{
    fn generate(&self, fault: &PipelineFault) -> T {
        self(fault)
    }
}

pub struct FallbackStrategy {
    name: String,
    handle_execution_faults: bool,
    event_listeners: EventListeners<FallbackEvent>,
}

impl FallbackStrategy {
    pub fn new(name: impl Into<String>, handle_execution_faults: bool) -> Self {
        Self {
            name: name.into(),
            handle_execution_faults,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn with_listeners(
        name: impl Into<String>,
        handle_execution_faults: bool,
        event_listeners: EventListeners<FallbackEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            handle_execution_faults,
            event_listeners,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle_execution_faults(&self) -> bool {
        self.handle_execution_faults
    }

    /// Runs `inner`, substituting the generator's output for any fault
    /// this strategy is configured to handle. Faults it doesn't handle
    /// (including `RateLimitRejected`, always) propagate unchanged.
    pub async fn execute<T, Fut>(
        &self,
        ctx: &ResilienceContext,
        inner: Fut,
        generator: Option<&(dyn FallbackGenerator<T> + '_)>,
    ) -> Result<T, PipelineFault>
    where
        T: Default,
        Fut: Future<Output = Result<T, PipelineFault>>,
    {
        match inner.await {
            Ok(value) => Ok(value),
            Err(fault) if should_handle(&fault, self.handle_execution_faults) => {
                self.event_listeners.emit(&FallbackEvent::FallbackInvoked {
                    operation_key: ctx.operation_key.clone(),
                    timestamp: Instant::now(),
                });

                #[cfg(feature = "tracing")]
                tracing::info!(operation_key = %ctx.operation_key, fault = %fault, "fallback invoked");

                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "resilience_fallback_invocations_total",
                    "operation_key" => ctx.operation_key.clone()
                )
                .increment(1);

                Ok(match generator {
                    Some(generator) => generator.generate(&fault),
                    None => T::default(),
                })
            }
            Err(fault) => {
                self.event_listeners.emit(&FallbackEvent::FaultNotHandled {
                    operation_key: ctx.operation_key.clone(),
                    timestamp: Instant::now(),
                });
                Err(fault)
            }
        }
    }
}
