//! Memoised per-`(endpoint, resource)` pipeline cache.
//!
//! The registry is the only place that ever calls the strategy
//! constructors directly: every other crate receives pipelines and
//! fallback strategies already built. It owns two cooperating caches
//! (see `key.rs`):
//!
//! - an untyped [`Pipeline`] cache keyed by `(endpoint, resource)`:
//!   rate limiter, breaker, timeout and retry never vary with a caller's
//!   fallback choice, and keying on that would split one resource's
//!   breaker window across multiple shadow breakers;
//! - a [`FallbackStrategy`] cache keyed additionally by
//!   `handles_execution_faults`, layered on top.
//!
//! A coarse `Mutex` guards both caches together, which trivially gives
//! "at most one build per key": a concurrent `get_or_build` for the same
//! key blocks on the lock rather than racing a second construction.

mod endpoint_config;
#[cfg(feature = "config")]
mod config_source;
mod key;

pub use endpoint_config::{EndpointConfig, EndpointConfigSource, StaticConfigSource};
#[cfg(feature = "config")]
pub use config_source::{ConfigFileSource, ConfigSourceError};
pub use key::PipelineKey;

use key::UntypedKey;
use resilience_circuitbreaker::{CircuitBreakerConfigBuilder, CircuitBreakerStrategy};
use resilience_fallback::FallbackStrategy;
use resilience_pipeline::Pipeline;
use resilience_ratelimiter::{RateLimiterConfig, RateLimiterStrategy};
use resilience_retry::{RetryConfigBuilder, RetryStrategy};
use resilience_timelimiter::{TimeLimiterConfigBuilder, TimeLimiterStrategy};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Extra slack added on top of an endpoint's configured timeout before
/// it's handed to the time limiter, so a caller-visible `Timeout` always
/// has a chance to fire before this coarser, last-resort deadline does.
const TIMEOUT_SLACK: Duration = Duration::from_secs(1);

/// Why a pipeline couldn't be built or retrieved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no configuration registered for endpoint '{0}'")]
    UnknownEndpoint(String),
}

/// Everything a caller needs to run one logical call: the shared
/// untyped pipeline plus the fallback wrapper built for this caller's
/// `handles_execution_faults` choice, and the registry generation this
/// entry was built under (see [`Registry::generation`]).
pub struct PipelineEntry {
    pub pipeline: Arc<Pipeline>,
    pub fallback: Arc<FallbackStrategy>,
    pub generation: u64,
}

struct Inner {
    pipelines: HashMap<(String, String), Arc<Pipeline>>,
    entries: HashMap<PipelineKey, Arc<PipelineEntry>>,
    /// Keyed by endpoint only: `RateLimit` is configured per-endpoint, so
    /// every resource (breaker shard) of that endpoint shares one set of
    /// token buckets rather than getting its own.
    rate_limiters: HashMap<String, Arc<RateLimiterStrategy>>,
    isolated: HashSet<String>,
    generation: u64,
}

impl Inner {
    fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
            entries: HashMap::new(),
            rate_limiters: HashMap::new(),
            isolated: HashSet::new(),
            generation: 0,
        }
    }
}

/// The registry itself. Typically constructed once per process and
/// shared behind an `Arc` by the executor and the admin surface
/// (`/reload`, isolate endpoints).
pub struct Registry<S: EndpointConfigSource> {
    source: S,
    inner: Mutex<Inner>,
}

impl<S: EndpointConfigSource> Registry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Current generation. Bumped by [`Registry::clear`]; a caller
    /// holding a stale [`PipelineEntry`] can compare generations to
    /// decide whether to re-fetch rather than keep using it past a
    /// config reload.
    pub fn generation(&self) -> u64 {
        self.inner.lock().unwrap().generation
    }

    /// Returns the cached entry for `key`, building it (and the
    /// underlying untyped pipeline, if not already cached for this
    /// `(endpoint, resource)`) on first use.
    pub fn get_or_build(&self, key: &PipelineKey) -> Result<Arc<PipelineEntry>, RegistryError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some(entry) = inner.entries.get(key) {
            return Ok(Arc::clone(entry));
        }

        let config = self
            .source
            .get(&key.endpoint)
            .ok_or_else(|| RegistryError::UnknownEndpoint(key.endpoint.clone()))?;

        let untyped_key = UntypedKey::from(key);
        let pipeline = match inner.pipelines.get(&(untyped_key.endpoint.clone(), untyped_key.resource.clone())) {
            Some(pipeline) => Arc::clone(pipeline),
            None => {
                let isolate = config.isolate || inner.isolated.contains(&key.endpoint);
                let rate_limiter = match inner.rate_limiters.get(&key.endpoint) {
                    Some(rate_limiter) => Arc::clone(rate_limiter),
                    None => {
                        let rate_limiter = Arc::new(RateLimiterStrategy::new(RateLimiterConfig::new(
                            config.rate_limit,
                            config.rate_limit_period,
                            &key.endpoint,
                        )));
                        inner.rate_limiters.insert(key.endpoint.clone(), Arc::clone(&rate_limiter));
                        rate_limiter
                    }
                };
                let pipeline = Arc::new(build_pipeline(&key.resource, &config, isolate, rate_limiter));
                inner
                    .pipelines
                    .insert((untyped_key.endpoint, untyped_key.resource), Arc::clone(&pipeline));
                pipeline
            }
        };

        let fallback = Arc::new(FallbackStrategy::new(key.resource.clone(), key.handles_execution_faults));
        let entry = Arc::new(PipelineEntry {
            pipeline,
            fallback,
            generation: inner.generation,
        });
        inner.entries.insert(key.clone(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Administratively forces the breaker for every resource of
    /// `endpoint` into the `Isolated` state, immediately for pipelines
    /// already built and for any built afterwards until a [`Registry::clear`].
    pub fn isolate(&self, endpoint: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.isolated.insert(endpoint.to_string());
        for ((pipeline_endpoint, _), pipeline) in inner.pipelines.iter() {
            if pipeline_endpoint == endpoint {
                pipeline.circuit_breaker().isolate();
            }
        }
    }

    /// Drops every cached pipeline and fallback, clears administrative
    /// isolation, and bumps the generation counter. The next
    /// `get_or_build` for any key rebuilds from the current config
    /// source from a clean slate: fresh breaker windows, fresh rate
    /// buckets, fresh retry state.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.pipelines.clear();
        inner.entries.clear();
        inner.rate_limiters.clear();
        inner.isolated.clear();
        inner.generation += 1;
    }
}

fn build_pipeline(resource: &str, config: &EndpointConfig, isolate: bool, rate_limiter: Arc<RateLimiterStrategy>) -> Pipeline {
    let circuit_breaker = Arc::new(CircuitBreakerStrategy::new(
        CircuitBreakerConfigBuilder::new(resource)
            .sliding_window_time_based(config.failure_sampling_duration)
            .minimum_number_of_calls(config.failure_minimum_throughput)
            .failure_rate_threshold(config.failure_threshold)
            .wait_duration_in_open(config.failure_break_duration)
            .build(),
    ));
    if isolate {
        circuit_breaker.isolate();
    }

    let time_limiter = Arc::new(TimeLimiterStrategy::new(
        TimeLimiterConfigBuilder::new(resource).timeout_duration(config.timeout + TIMEOUT_SLACK).build(),
    ));

    let retry = Arc::new(RetryStrategy::new(
        RetryConfigBuilder::new(resource)
            .retries(config.retries)
            .delay_seed(config.retry_delay_seed)
            .delay_maximum(config.retry_delay_maximum)
            .build(),
    ));

    Pipeline::new(rate_limiter, circuit_breaker, time_limiter, retry)
}
