//! Composes the four inner strategies into the fixed order mandated for
//! every endpoint/resource pipeline:
//!
//! ```text
//! Retry( CircuitBreaker( Timeout( RateLimit( op ) ) ) )
//! ```
//!
//! `RateLimit` sits innermost so a retried attempt also consumes a token
//! (matching the source's left-to-right outermost composition order);
//! `Timeout` sits inside `CircuitBreaker` so a timed-out attempt counts
//! toward the breaker's window; `CircuitBreaker` sits inside `Retry` so a
//! broken circuit can abandon further attempts instead of retrying
//! against a dependency already known to be failing.
//!
//! Fallback is deliberately not composed here, see
//! `resilience-executor`, which wraps a `Pipeline` with a
//! `resilience_fallback::FallbackStrategy` only for callers that asked
//! for one, keeping the untyped pipeline single-sourced for both cases.

use resilience_circuitbreaker::CircuitBreakerStrategy;
use resilience_core::{PipelineFault, ResilienceContext};
use resilience_ratelimiter::RateLimiterStrategy;
use resilience_retry::RetryStrategy;
use resilience_timelimiter::TimeLimiterStrategy;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// One fully-composed strategy stack for a single `(endpoint, resource)`
/// pair (see `resilience-registry::PipelineKey`).
///
/// Built once by the registry and shared by every caller targeting that
/// key; all inner strategies are independently thread-safe so `Pipeline`
/// itself needs no additional synchronisation.
pub struct Pipeline {
    rate_limiter: Arc<RateLimiterStrategy>,
    circuit_breaker: Arc<CircuitBreakerStrategy>,
    time_limiter: Arc<TimeLimiterStrategy>,
    retry: Arc<RetryStrategy>,
}

impl Pipeline {
    pub fn new(
        rate_limiter: Arc<RateLimiterStrategy>,
        circuit_breaker: Arc<CircuitBreakerStrategy>,
        time_limiter: Arc<TimeLimiterStrategy>,
        retry: Arc<RetryStrategy>,
    ) -> Self {
        Self {
            rate_limiter,
            circuit_breaker,
            time_limiter,
            retry,
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreakerStrategy {
        &self.circuit_breaker
    }

    pub fn rate_limiter(&self) -> &RateLimiterStrategy {
        &self.rate_limiter
    }

    /// Runs `action` through the composed stack for one logical call,
    /// including every retry attempt the retry strategy decides to make.
    ///
    /// `action` is a factory, not a bare future: retries need a fresh one
    /// per attempt, and the circuit breaker's admission check must run
    /// again before each attempt too.
    pub async fn execute<T, F, Fut>(&self, ctx: &ResilienceContext, action: F) -> Result<T, PipelineFault>
    where
        T: Send + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PipelineFault>> + Send + 'static,
    {
        self.retry
            .execute(ctx, || self.execute_one_attempt(ctx, &action))
            .await
    }

    async fn execute_one_attempt<T, F, Fut>(&self, ctx: &ResilienceContext, action: &F) -> Result<T, PipelineFault>
    where
        T: Send + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PipelineFault>> + Send + 'static,
    {
        self.circuit_breaker.try_acquire()?;

        let started = Instant::now();
        let rate_limiter = Arc::clone(&self.rate_limiter);
        let outcome = self
            .time_limiter
            .execute(ctx, Self::rate_limited_action(rate_limiter, ctx.clone(), action()))
            .await;
        let duration = started.elapsed();

        // Invariant 4: a rate-limit rejection never touches the breaker
        // window, not even as a recorded success, even though the rate
        // limiter sits inside the breaker in the fixed composition order.
        if !matches!(outcome, Err(PipelineFault::RateLimitRejected)) {
            self.circuit_breaker.on_outcome(&outcome, duration);
        }
        outcome
    }

    async fn rate_limited_action<T>(
        rate_limiter: Arc<RateLimiterStrategy>,
        ctx: ResilienceContext,
        action: impl Future<Output = Result<T, PipelineFault>> + Send,
    ) -> Result<T, PipelineFault> {
        rate_limiter.try_acquire(&ctx)?;
        action.await
    }
}
