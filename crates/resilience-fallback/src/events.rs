use resilience_core::ResilienceEvent;
use std::time::Instant;

/// Events emitted by the fallback strategy.
#[derive(Debug, Clone)]
pub enum FallbackEvent {
    /// A classified fault was caught and replaced with a substitute value.
    FallbackInvoked {
        operation_key: String,
        timestamp: Instant,
    },
    /// A fault occurred but wasn't one this fallback is configured to
    /// handle, so it was left to propagate.
    FaultNotHandled {
        operation_key: String,
        timestamp: Instant,
    },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FallbackEvent::FallbackInvoked { .. } => "fallback_invoked",
            FallbackEvent::FaultNotHandled { .. } => "fault_not_handled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FallbackEvent::FallbackInvoked { timestamp, .. }
            | FallbackEvent::FaultNotHandled { timestamp, .. } => *timestamp,
        }
    }

    fn operation_key(&self) -> &str {
        match self {
            FallbackEvent::FallbackInvoked { operation_key, .. }
            | FallbackEvent::FaultNotHandled { operation_key, .. } => operation_key,
        }
    }
}
