//! The immutable per-endpoint configuration snapshot and the abstraction
//! the registry reads it through.
//!
//! The registry itself knows nothing about *where* an `EndpointConfig`
//! comes from (the `config` crate, a static map in tests, a hand-rolled
//! admin API), only that it can ask an [`EndpointConfigSource`] for one by
//! name on every pipeline build.

use std::collections::HashMap;
use std::time::Duration;

/// Immutable snapshot describing one named upstream dependency.
///
/// See `SPEC_FULL.md` §3/§6: bound from `Api.Endpoints.<Name>.*` in the
/// live config source the host application wires up.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    pub name: String,
    pub timeout: Duration,
    pub failure_threshold: f64,
    pub failure_sampling_duration: Duration,
    pub failure_minimum_throughput: usize,
    pub failure_break_duration: Duration,
    pub retries: usize,
    pub retry_delay_seed: Duration,
    pub retry_delay_maximum: Duration,
    /// Tokens issued per `rate_limit_period`. `0` disables rate limiting.
    pub rate_limit: u32,
    pub rate_limit_period: Duration,
    /// Administrative/static override forcing the breaker to start (and
    /// stay) `Isolated` until a `Clear()` with this set back to `false`.
    pub isolate: bool,
}

impl EndpointConfig {
    /// Reasonable defaults for an endpoint that hasn't customised
    /// anything beyond a name: no retries, no rate limit, a single-digit
    /// second timeout, and a conservative breaker.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout: Duration::from_secs(5),
            failure_threshold: 0.5,
            failure_sampling_duration: Duration::from_secs(30),
            failure_minimum_throughput: 10,
            failure_break_duration: Duration::from_secs(60),
            retries: 0,
            retry_delay_seed: Duration::from_millis(200),
            retry_delay_maximum: Duration::from_secs(2),
            rate_limit: 0,
            rate_limit_period: Duration::from_secs(1),
            isolate: false,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn failure_threshold(mut self, threshold: f64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn failure_sampling_duration(mut self, duration: Duration) -> Self {
        self.failure_sampling_duration = duration;
        self
    }

    pub fn failure_minimum_throughput(mut self, throughput: usize) -> Self {
        self.failure_minimum_throughput = throughput;
        self
    }

    pub fn failure_break_duration(mut self, duration: Duration) -> Self {
        self.failure_break_duration = duration;
        self
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_delay_seed(mut self, delay: Duration) -> Self {
        self.retry_delay_seed = delay;
        self
    }

    pub fn retry_delay_maximum(mut self, delay: Duration) -> Self {
        self.retry_delay_maximum = delay;
        self
    }

    pub fn rate_limit(mut self, rate_limit: u32, period: Duration) -> Self {
        self.rate_limit = rate_limit;
        self.rate_limit_period = period;
        self
    }

    pub fn isolate(mut self, isolate: bool) -> Self {
        self.isolate = isolate;
        self
    }
}

/// Read-through source of [`EndpointConfig`] snapshots, by endpoint name.
///
/// Implemented against a live `config::Config` by the host application
/// (see `demos/movies-api`); [`StaticConfigSource`] below is a fixed-map
/// test double that doesn't pull in the `config` crate at all.
pub trait EndpointConfigSource: Send + Sync {
    fn get(&self, name: &str) -> Option<EndpointConfig>;
}

/// A fixed, in-memory [`EndpointConfigSource`] for unit and integration
/// tests, and for hosts that don't need hot-reloadable configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    endpoints: HashMap<String, EndpointConfig>,
}

impl StaticConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, config: EndpointConfig) -> Self {
        self.endpoints.insert(config.name.clone(), config);
        self
    }
}

impl EndpointConfigSource for StaticConfigSource {
    fn get(&self, name: &str) -> Option<EndpointConfig> {
        self.endpoints.get(name).cloned()
    }
}
