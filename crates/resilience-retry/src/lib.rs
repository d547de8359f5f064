//! Decorrelated-jitter retry strategy.
//!
//! Retries the caller-supplied action when the classifier says the fault
//! it produced is retryable (`resilience_classifier::can_retry`, gated by
//! the context's HTTP method for idempotency). The action is represented
//! as a factory rather than a bare `Future` since a future that failed
//! can't be polled again, so each attempt gets its own fresh one.

mod backoff;
mod config;
mod events;

pub use backoff::DecorrelatedJitter;
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;

use rand::Rng;
use resilience_classifier::can_retry;
use resilience_core::{PipelineFault, ResilienceContext};
use std::future::Future;
use std::time::Instant;

pub struct RetryStrategy {
    config: RetryConfig,
}

impl RetryStrategy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub async fn execute<T, F, Fut>(&self, ctx: &ResilienceContext, mut action: F) -> Result<T, PipelineFault>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PipelineFault>>,
    {
        let mut jitter = DecorrelatedJitter::new(self.config.delay_seed, self.config.delay_maximum);
        let mut attempt = 0usize;

        loop {
            let result = action().await;
            attempt += 1;

            match result {
                Ok(value) => {
                    self.config.event_listeners.emit(&RetryEvent::Success {
                        operation_key: ctx.operation_key.clone(),
                        attempts: attempt,
                        timestamp: Instant::now(),
                    });
                    return Ok(value);
                }
                Err(fault) => {
                    let exhausted = attempt > self.config.retries;
                    if exhausted || !can_retry(&fault, ctx.method) {
                        self.config.event_listeners.emit(&RetryEvent::Exhausted {
                            operation_key: ctx.operation_key.clone(),
                            attempts: attempt,
                            timestamp: Instant::now(),
                        });
                        return Err(fault);
                    }

                    let draw: f64 = rand::rng().random();
                    let delay = jitter.next_delay(draw);

                    self.config.event_listeners.emit(&RetryEvent::RetryAttempt {
                        operation_key: ctx.operation_key.clone(),
                        attempt,
                        delay,
                        timestamp: Instant::now(),
                    });

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        operation_key = %ctx.operation_key,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "retrying after classified fault"
                    );

                    #[cfg(feature = "metrics")]
                    metrics::counter!(
                        "resilience_retry_attempts_total",
                        "operation_key" => ctx.operation_key.clone()
                    )
                    .increment(1);

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience_core::{HttpMethod, OperationFault};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn ctx(method: HttpMethod) -> ResilienceContext {
        ResilienceContext::new("movies.get", "tenant-a", "get_movie", method, CancellationToken::new())
    }

    fn retryable_fault() -> PipelineFault {
        PipelineFault::Operation(OperationFault::Api {
            status: 503,
            method: HttpMethod::Get,
            uri: "u".into(),
        })
    }

    fn strategy(retries: usize) -> RetryStrategy {
        RetryStrategy::new(
            RetryConfigBuilder::new("movies")
                .retries(retries)
                .delay_seed(Duration::from_millis(1))
                .delay_maximum(Duration::from_millis(5))
                .build(),
        )
    }

    #[tokio::test]
    async fn invokes_action_exactly_retries_plus_one_times_on_persistent_failure() {
        let strategy = strategy(2);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let result: Result<(), PipelineFault> = strategy
            .execute(&ctx(HttpMethod::Get), || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(retryable_fault())
                }
            })
            .await;

        assert_eq!(result, Err(retryable_fault()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_get_requests_are_invoked_exactly_once() {
        let strategy = strategy(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let _result: Result<(), PipelineFault> = strategy
            .execute(&ctx(HttpMethod::Post), || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(retryable_fault())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn succeeds_after_a_retryable_failure_then_a_success() {
        let strategy = strategy(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let result = strategy
            .execute(&ctx(HttpMethod::Get), || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err(PipelineFault::Operation(OperationFault::Api {
                            status: 408,
                            method: HttpMethod::Get,
                            uri: "u".into(),
                        }))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_retries_disables_the_strategy() {
        let strategy = strategy(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let _result: Result<(), PipelineFault> = strategy
            .execute(&ctx(HttpMethod::Get), || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(retryable_fault())
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_retryable_faults_stop_immediately() {
        let strategy = strategy(3);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let _result: Result<(), PipelineFault> = strategy
            .execute(&ctx(HttpMethod::Get), || {
                let calls = Arc::clone(&calls_clone);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(PipelineFault::BrokenCircuit)
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
