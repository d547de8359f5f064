use resilience_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the timeout strategy.
#[derive(Debug, Clone)]
pub enum TimeLimiterEvent {
    Success {
        operation_key: String,
        duration: Duration,
        timestamp: Instant,
    },
    Error {
        operation_key: String,
        duration: Duration,
        timestamp: Instant,
    },
    /// The deadline elapsed before the action finished. The action keeps
    /// running in the background; its eventual outcome is reported via
    /// [`TimeLimiterEvent::AbandonedCompleted`], never to the caller.
    Timeout {
        operation_key: String,
        timeout_duration: Duration,
        timestamp: Instant,
    },
    /// The caller's own cancellation token fired before the action or the
    /// deadline did.
    CancelledByCaller {
        operation_key: String,
        timestamp: Instant,
    },
    /// An action abandoned after a timeout eventually finished on its own.
    AbandonedCompleted {
        operation_key: String,
        succeeded: bool,
        total_duration: Duration,
        timestamp: Instant,
    },
}

impl ResilienceEvent for TimeLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeLimiterEvent::Success { .. } => "success",
            TimeLimiterEvent::Error { .. } => "error",
            TimeLimiterEvent::Timeout { .. } => "timeout",
            TimeLimiterEvent::CancelledByCaller { .. } => "cancelled_by_caller",
            TimeLimiterEvent::AbandonedCompleted { .. } => "abandoned_completed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeLimiterEvent::Success { timestamp, .. }
            | TimeLimiterEvent::Error { timestamp, .. }
            | TimeLimiterEvent::Timeout { timestamp, .. }
            | TimeLimiterEvent::CancelledByCaller { timestamp, .. }
            | TimeLimiterEvent::AbandonedCompleted { timestamp, .. } => *timestamp,
        }
    }

    fn operation_key(&self) -> &str {
        match self {
            TimeLimiterEvent::Success { operation_key, .. }
            | TimeLimiterEvent::Error { operation_key, .. }
            | TimeLimiterEvent::Timeout { operation_key, .. }
            | TimeLimiterEvent::CancelledByCaller { operation_key, .. }
            | TimeLimiterEvent::AbandonedCompleted { operation_key, .. } => operation_key,
        }
    }
}
