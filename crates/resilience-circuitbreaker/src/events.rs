use crate::circuit::CircuitState;
use resilience_core::ResilienceEvent;
use std::time::{Duration, Instant};

/// Events emitted by the circuit-breaker strategy.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    CallPermitted {
        operation_key: String,
        state: CircuitState,
        timestamp: Instant,
    },
    CallRejected {
        operation_key: String,
        state: CircuitState,
        timestamp: Instant,
    },
    SuccessRecorded {
        operation_key: String,
        state: CircuitState,
        timestamp: Instant,
    },
    FailureRecorded {
        operation_key: String,
        state: CircuitState,
        timestamp: Instant,
    },
    SlowCallDetected {
        operation_key: String,
        state: CircuitState,
        duration: Duration,
        timestamp: Instant,
    },
    StateTransition {
        operation_key: String,
        from_state: CircuitState,
        to_state: CircuitState,
        timestamp: Instant,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
            CircuitBreakerEvent::SlowCallDetected { .. } => "slow_call_detected",
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. }
            | CircuitBreakerEvent::SlowCallDetected { timestamp, .. }
            | CircuitBreakerEvent::StateTransition { timestamp, .. } => *timestamp,
        }
    }

    fn operation_key(&self) -> &str {
        match self {
            CircuitBreakerEvent::CallPermitted { operation_key, .. }
            | CircuitBreakerEvent::CallRejected { operation_key, .. }
            | CircuitBreakerEvent::SuccessRecorded { operation_key, .. }
            | CircuitBreakerEvent::FailureRecorded { operation_key, .. }
            | CircuitBreakerEvent::SlowCallDetected { operation_key, .. }
            | CircuitBreakerEvent::StateTransition { operation_key, .. } => operation_key,
        }
    }
}
