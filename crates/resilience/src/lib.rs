//! Fixed-order resilience pipeline engine for outbound dependency calls.
//!
//! Every call an `Executor` runs passes through the same, non-negotiable
//! stack, innermost first:
//!
//! ```text
//! Retry( CircuitBreaker( Timeout( RateLimit( operation ) ) ) )
//! ```
//!
//! with an optional `Fallback` wrapped around the whole thing when a
//! caller asks for one. There is no layer ordering to configure and no
//! way to compose a subset of the stack for one resource but not
//! another: the pipeline is the same shape for every `(endpoint,
//! resource)` pair an application registers, which is what keeps one
//! endpoint's behaviour under load predictable from another's.
//!
//! # Where each concern lives
//!
//! - [`resilience_core`]: the shared fault taxonomy (`PipelineFault`,
//!   `OperationFault`, `ConnectionFault`), the per-call
//!   `ResilienceContext`, and the panic-isolated event listener plumbing
//!   every strategy reports through.
//! - [`resilience_classifier`]: the pure predicates (`can_retry`,
//!   `can_circuit_break`) that decide which faults count against a
//!   breaker's window or are worth retrying, shared by every strategy
//!   that needs an answer to either question.
//! - [`resilience_ratelimiter`]: partitioned, non-blocking token-bucket
//!   admission control, one bucket per `rate_limit_partition` value
//!   (tenant, API key, ...) seen on the context.
//! - [`resilience_circuitbreaker`]: the sliding-window breaker
//!   (count- or time-based), with `Closed` / `Open` / `HalfOpen` /
//!   `Isolated` states and administrative isolation.
//! - [`resilience_timelimiter`]: a pessimistic per-call deadline that
//!   races the caller's own cancellation signal; a timed-out action
//!   keeps running in the background rather than being dropped.
//! - [`resilience_retry`]: decorrelated-jitter backoff over a bounded
//!   number of attempts, gated by the classifier so non-idempotent or
//!   unretryable faults are never retried.
//! - [`resilience_fallback`]: typed substitution for faults the caller
//!   opted into handling, layered outside the composed pipeline.
//! - [`resilience_pipeline`]: composes the four inner strategies above
//!   into the fixed order for one `(endpoint, resource)` pair.
//! - [`resilience_registry`]: memoises pipelines per `(endpoint,
//!   resource)` and fallback wrappers per `(endpoint, resource,
//!   handles_execution_faults)`, binds `EndpointConfig` from a
//!   configuration source, and exposes the administrative `isolate` /
//!   `clear` operations a reload or an operator action triggers.
//! - [`resilience_executor`]: the single operation a host calls:
//!   `Executor::execute` resolves the pipeline, applies the caller-side
//!   404/400 short-circuit policy, and runs the stack.
//!
//! # Example
//!
//! ```no_run
//! use resilience::core::{HttpMethod, PipelineFault};
//! use resilience::executor::{Executor, ExecuteOptions};
//! use resilience::registry::{EndpointConfig, Registry, StaticConfigSource};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), PipelineFault> {
//! let source = StaticConfigSource::new()
//!     .with_endpoint(EndpointConfig::new("movies").retries(2).rate_limit(100, std::time::Duration::from_secs(1)));
//! let registry = Arc::new(Registry::new(source));
//! let executor = Executor::new("movies", registry);
//!
//! let movie = executor
//!     .execute(
//!         "tenant-a",
//!         "get_movie",
//!         HttpMethod::Get,
//!         || async { Ok::<_, PipelineFault>(42u32) },
//!         ExecuteOptions::new(),
//!         CancellationToken::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! `tracing` and `metrics` are additive instrumentation, off by default.
//! Every strategy crate emits spans/events or counters and gauges
//! through its own feature of the same name; enabling either here
//! cascades it to all nine constituent crates.

pub use resilience_circuitbreaker as circuitbreaker;
pub use resilience_classifier as classifier;
pub use resilience_core as core;
pub use resilience_executor as executor;
pub use resilience_fallback as fallback;
pub use resilience_pipeline as pipeline;
pub use resilience_ratelimiter as ratelimiter;
pub use resilience_registry as registry;
pub use resilience_retry as retry;
pub use resilience_timelimiter as timelimiter;
