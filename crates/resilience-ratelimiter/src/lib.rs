//! Partitioned, non-blocking token-bucket rate limiting.
//!
//! One [`RateLimiterStrategy`] is built per endpoint (rate limits are
//! configured at the endpoint level and shared across every resource of
//! that endpoint, see the pipeline registry). Internally it keeps one
//! [`bucket::TokenBucket`] per `rate_limit_partition` value seen on the
//! [`ResilienceContext`], so a partition key such as a tenant id or API
//! token gets its own independent quota.
//!
//! Acquisition never waits: a request either gets a token now or is
//! rejected with [`PipelineFault::RateLimitRejected`] immediately.

mod bucket;
mod events;

pub use events::RateLimiterEvent;

use bucket::TokenBucket;
use resilience_core::{EventListeners, PipelineFault, ResilienceContext};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Configuration for a single endpoint's rate limiter.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Permits issued per `period`. `0` disables rate limiting entirely
    /// (every acquisition succeeds without even allocating a bucket).
    pub rate_limit: u32,
    pub period: Duration,
    pub name: String,
}

impl RateLimiterConfig {
    pub fn new(rate_limit: u32, period: Duration, name: impl Into<String>) -> Self {
        Self {
            rate_limit,
            period,
            name: name.into(),
        }
    }

    fn refill_per_sec(&self) -> f64 {
        self.rate_limit as f64 / self.period.as_secs_f64()
    }
}

/// The rate-limiting strategy for one endpoint.
pub struct RateLimiterStrategy {
    config: RateLimiterConfig,
    buckets: Mutex<HashMap<String, TokenBucket>>,
    listeners: EventListeners<RateLimiterEvent>,
}

impl RateLimiterStrategy {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
            listeners: EventListeners::new(),
        }
    }

    pub fn with_listeners(config: RateLimiterConfig, listeners: EventListeners<RateLimiterEvent>) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
            listeners,
        }
    }

    /// Attempts to draw a permit for `ctx.rate_limit_partition`.
    ///
    /// Disabled (`rate_limit == 0`) limiters always succeed. Idle buckets,
    /// untouched for more than twice the refresh period, are swept on
    /// every call so a long-tail of one-shot partition keys doesn't grow
    /// the map unboundedly.
    pub fn try_acquire(&self, ctx: &ResilienceContext) -> Result<(), PipelineFault> {
        if self.config.rate_limit == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap();

        self.sweep_idle(&mut buckets, now, &ctx.operation_key);

        let bucket = buckets.entry(ctx.rate_limit_partition.clone()).or_insert_with(|| {
            TokenBucket::new(self.config.rate_limit as f64, self.config.refill_per_sec(), now)
        });

        if bucket.try_acquire(now) {
            self.listeners.emit(&RateLimiterEvent::PermitAcquired {
                operation_key: ctx.operation_key.clone(),
                partition: ctx.rate_limit_partition.clone(),
                timestamp: now,
            });
            Ok(())
        } else {
            self.listeners.emit(&RateLimiterEvent::PermitRejected {
                operation_key: ctx.operation_key.clone(),
                partition: ctx.rate_limit_partition.clone(),
                timestamp: now,
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(
                operation_key = %ctx.operation_key,
                partition = %ctx.rate_limit_partition,
                "rate limiter rejected permit"
            );

            #[cfg(feature = "metrics")]
            metrics::counter!(
                "resilience_ratelimiter_rejections_total",
                "operation_key" => ctx.operation_key.clone(),
                "partition" => ctx.rate_limit_partition.clone()
            )
            .increment(1);

            Err(PipelineFault::RateLimitRejected)
        }
    }

    fn sweep_idle(&self, buckets: &mut HashMap<String, TokenBucket>, now: Instant, operation_key: &str) {
        let eviction_threshold = self.config.period * 2;
        let mut evicted = Vec::new();
        buckets.retain(|partition, bucket| {
            let idle = bucket.idle_for(now);
            if idle > eviction_threshold {
                evicted.push((partition.clone(), idle));
                false
            } else {
                true
            }
        });
        for (partition, idle_for) in evicted {
            self.listeners.emit(&RateLimiterEvent::BucketEvicted {
                operation_key: operation_key.to_string(),
                partition,
                idle_for,
                timestamp: now,
            });
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}
