//! Pessimistic timeout strategy.
//!
//! Unlike a simple `tokio::time::timeout` wrapper, which drops the inner
//! future the instant the deadline elapses, this strategy spawns the
//! action onto its own task before racing it. When the deadline wins, the
//! caller gets [`PipelineFault::TimeoutRejected`] immediately but the
//! spawned task is left running to completion in the background; its
//! eventual result is only logged (via [`TimeLimiterEvent::AbandonedCompleted`]),
//! never surfaced to the caller. This matters for operations with
//! side effects on the far end: a caller that gave up on waiting
//! shouldn't cause the in-flight write to be silently torn down too.
//!
//! The caller's own [`tokio_util::sync::CancellationToken`] is raced
//! alongside the deadline. If it wins, the spawned task is aborted (the
//! caller asked to stop, not just to stop waiting), and the fault
//! surfaced is [`resilience_core::OperationFault::Cancelled`] with
//! `by_caller: true`, never `TimeoutRejected`.

mod config;
mod events;

pub use config::{TimeLimiterConfig, TimeLimiterConfigBuilder};
pub use events::TimeLimiterEvent;

use resilience_core::{OperationFault, PipelineFault, ResilienceContext};
use std::future::Future;
use std::time::Instant;

pub struct TimeLimiterStrategy {
    config: TimeLimiterConfig,
}

impl TimeLimiterStrategy {
    pub fn new(config: TimeLimiterConfig) -> Self {
        Self { config }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub async fn execute<T, Fut>(&self, ctx: &ResilienceContext, action: Fut) -> Result<T, PipelineFault>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, PipelineFault>> + Send + 'static,
    {
        let start = Instant::now();
        let mut handle = tokio::spawn(action);
        let sleep = tokio::time::sleep(self.config.timeout_duration);
        tokio::pin!(sleep);
        let cancellation = ctx.cancellation.clone();

        tokio::select! {
            joined = &mut handle => {
                let duration = start.elapsed();
                match joined {
                    Ok(Ok(value)) => {
                        self.config.event_listeners.emit(&TimeLimiterEvent::Success {
                            operation_key: ctx.operation_key.clone(),
                            duration,
                            timestamp: Instant::now(),
                        });
                        Ok(value)
                    }
                    Ok(Err(fault)) => {
                        self.config.event_listeners.emit(&TimeLimiterEvent::Error {
                            operation_key: ctx.operation_key.clone(),
                            duration,
                            timestamp: Instant::now(),
                        });
                        Err(fault)
                    }
                    Err(join_err) => {
                        self.config.event_listeners.emit(&TimeLimiterEvent::Error {
                            operation_key: ctx.operation_key.clone(),
                            duration,
                            timestamp: Instant::now(),
                        });
                        Err(PipelineFault::Operation(OperationFault::Unclassified(join_err.to_string())))
                    }
                }
            }
            _ = &mut sleep => {
                self.config.event_listeners.emit(&TimeLimiterEvent::Timeout {
                    operation_key: ctx.operation_key.clone(),
                    timeout_duration: self.config.timeout_duration,
                    timestamp: Instant::now(),
                });

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    operation_key = %ctx.operation_key,
                    timeout_ms = self.config.timeout_duration.as_millis(),
                    "time limiter deadline elapsed"
                );

                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "resilience_timelimiter_timeouts_total",
                    "operation_key" => ctx.operation_key.clone()
                )
                .increment(1);

                let operation_key = ctx.operation_key.clone();
                let listeners = self.config.event_listeners.clone();
                tokio::spawn(async move {
                    let succeeded = matches!(handle.await, Ok(Ok(_)));
                    listeners.emit(&TimeLimiterEvent::AbandonedCompleted {
                        operation_key,
                        succeeded,
                        total_duration: start.elapsed(),
                        timestamp: Instant::now(),
                    });
                });

                Err(PipelineFault::TimeoutRejected)
            }
            _ = cancellation.cancelled() => {
                handle.abort();
                self.config.event_listeners.emit(&TimeLimiterEvent::CancelledByCaller {
                    operation_key: ctx.operation_key.clone(),
                    timestamp: Instant::now(),
                });
                Err(PipelineFault::Operation(OperationFault::Cancelled { by_caller: true }))
            }
        }
    }
}
