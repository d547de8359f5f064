use std::time::Duration;
use std::time::Instant;
use resilience_core::ResilienceEvent;

/// Events emitted by the rate-limiter strategy.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A permit was granted immediately; no tokens had to be waited on.
    PermitAcquired {
        operation_key: String,
        partition: String,
        timestamp: Instant,
    },
    /// No token was available in the partition's bucket and the request
    /// was rejected without waiting (this strategy never blocks).
    PermitRejected {
        operation_key: String,
        partition: String,
        timestamp: Instant,
    },
    /// An idle bucket was swept from the partition map.
    BucketEvicted {
        operation_key: String,
        partition: String,
        idle_for: Duration,
        timestamp: Instant,
    },
}

impl ResilienceEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::PermitAcquired { .. } => "permit_acquired",
            RateLimiterEvent::PermitRejected { .. } => "permit_rejected",
            RateLimiterEvent::BucketEvicted { .. } => "bucket_evicted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::PermitAcquired { timestamp, .. }
            | RateLimiterEvent::PermitRejected { timestamp, .. }
            | RateLimiterEvent::BucketEvicted { timestamp, .. } => *timestamp,
        }
    }

    fn operation_key(&self) -> &str {
        match self {
            RateLimiterEvent::PermitAcquired { operation_key, .. }
            | RateLimiterEvent::PermitRejected { operation_key, .. }
            | RateLimiterEvent::BucketEvicted { operation_key, .. } => operation_key,
        }
    }
}
