use resilience_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the retry strategy.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// About to wait `delay` before re-issuing attempt number `attempt`
    /// (1-indexed: the first retry is attempt 1).
    RetryAttempt {
        operation_key: String,
        attempt: usize,
        delay: Duration,
        timestamp: Instant,
    },
    /// The action succeeded, possibly after one or more retries.
    Success {
        operation_key: String,
        attempts: usize,
        timestamp: Instant,
    },
    /// Every permitted attempt was exhausted without success.
    Exhausted {
        operation_key: String,
        attempts: usize,
        timestamp: Instant,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::RetryAttempt { .. } => "retry_attempt",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::RetryAttempt { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. } => *timestamp,
        }
    }

    fn operation_key(&self) -> &str {
        match self {
            RetryEvent::RetryAttempt { operation_key, .. }
            | RetryEvent::Success { operation_key, .. }
            | RetryEvent::Exhausted { operation_key, .. } => operation_key,
        }
    }
}
