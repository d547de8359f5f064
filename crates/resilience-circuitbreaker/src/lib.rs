//! Sliding-window circuit breaker strategy.
//!
//! One [`CircuitBreakerStrategy`] guards a single `(endpoint, resource)`
//! shard. Admission checks are synchronous and take only a `Mutex` over
//! the circuit's bookkeeping; a racing `AtomicU8` mirror of the state lets
//! callers that just want a cheap state read (diagnostics, `/reload`
//! summaries) skip the lock entirely.
//!
//! A rate-limit rejection is never passed to this strategy's outcome
//! recording at all: the pipeline only calls [`CircuitBreakerStrategy::on_outcome`]
//! for calls the circuit itself admitted, so `RateLimitRejected` (raised
//! by an inner rate limiter for a call the breaker already let through)
//! would never reach here; this module doesn't need to special-case it.

mod circuit;
mod config;
mod events;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, SlidingWindowType};
pub use events::CircuitBreakerEvent;

use circuit::Circuit;
use resilience_classifier::can_circuit_break;
use resilience_core::PipelineFault;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct CircuitBreakerStrategy {
    config: CircuitBreakerConfig,
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
}

impl CircuitBreakerStrategy {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new(Arc::clone(&state_atomic))),
            config,
            state_atomic,
        }
    }

    /// Lock-free read of the current state, for diagnostics.
    pub fn current_state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// `Err(BrokenCircuit)` / `Err(IsolatedCircuit)` if this call should be
    /// rejected without ever reaching the wrapped operation.
    pub fn try_acquire(&self) -> Result<(), PipelineFault> {
        let mut circuit = self.circuit.lock().unwrap();
        if circuit.try_acquire(&self.config) {
            Ok(())
        } else if circuit.state() == CircuitState::Isolated {
            Err(PipelineFault::IsolatedCircuit)
        } else {
            Err(PipelineFault::BrokenCircuit)
        }
    }

    /// Records the outcome of a call this breaker admitted.
    ///
    /// `outcome` is whatever the inner layers (timeout, the action itself)
    /// produced. A fault the classifier says is not circuit-breakable
    /// (e.g. a 404, or cancellation originated by the caller) is recorded
    /// as a window success so the breaker's statistics stay continuous
    /// without treating it as evidence of upstream unhealthiness.
    pub fn on_outcome<T>(&self, outcome: &Result<T, PipelineFault>, duration: Duration) {
        let mut circuit = self.circuit.lock().unwrap();
        match outcome {
            Ok(_) => circuit.record_success(&self.config, duration),
            Err(fault) if can_circuit_break(fault) => circuit.record_failure(&self.config, duration),
            Err(_) => circuit.record_success(&self.config, duration),
        }
    }

    pub fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().unwrap().metrics(&self.config)
    }

    /// Administratively forces the circuit open, rejecting every call
    /// until [`CircuitBreakerStrategy::reset`] is called.
    pub fn isolate(&self) {
        self.circuit.lock().unwrap().isolate(&self.config);
    }

    /// Returns an isolated or open circuit to `Closed` with a clean window.
    pub fn reset(&self) {
        self.circuit.lock().unwrap().reset(&self.config);
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience_core::OperationFault;

    fn breaker() -> CircuitBreakerStrategy {
        CircuitBreakerStrategy::new(
            CircuitBreakerConfigBuilder::new("movies")
                .sliding_window_count_based(4)
                .minimum_number_of_calls(4)
                .failure_rate_threshold(0.5)
                .wait_duration_in_open(Duration::from_millis(50))
                .permitted_calls_in_half_open(1)
                .build(),
        )
    }

    fn server_fault() -> PipelineFault {
        PipelineFault::Operation(OperationFault::Api {
            status: 503,
            method: resilience_core::HttpMethod::Get,
            uri: "https://upstream".into(),
        })
    }

    #[test]
    fn opens_after_failure_rate_exceeds_threshold() {
        let breaker = breaker();
        for _ in 0..2 {
            breaker.try_acquire().unwrap();
            breaker.on_outcome::<()>(&Ok(()), Duration::ZERO);
        }
        for _ in 0..2 {
            breaker.try_acquire().unwrap();
            breaker.on_outcome::<()>(&Err(server_fault()), Duration::ZERO);
        }
        assert_eq!(breaker.current_state(), CircuitState::Open);
        assert_eq!(breaker.try_acquire(), Err(PipelineFault::BrokenCircuit));
    }

    #[test]
    fn non_breakable_faults_do_not_open_the_circuit() {
        let breaker = breaker();
        let not_found = PipelineFault::Operation(OperationFault::Api {
            status: 404,
            method: resilience_core::HttpMethod::Get,
            uri: "u".into(),
        });
        for _ in 0..8 {
            breaker.try_acquire().unwrap();
            breaker.on_outcome::<()>(&Err(not_found.clone()), Duration::ZERO);
        }
        assert_eq!(breaker.current_state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_after_wait_duration_then_closes_on_success() {
        let breaker = breaker();
        for _ in 0..4 {
            breaker.try_acquire().unwrap();
            breaker.on_outcome::<()>(&Err(server_fault()), Duration::ZERO);
        }
        assert_eq!(breaker.current_state(), CircuitState::Open);

        std::thread::sleep(Duration::from_millis(60));
        breaker.try_acquire().unwrap();
        assert_eq!(breaker.current_state(), CircuitState::HalfOpen);

        breaker.on_outcome::<()>(&Ok(()), Duration::ZERO);
        assert_eq!(breaker.current_state(), CircuitState::Closed);
    }

    #[test]
    fn isolate_rejects_until_reset() {
        let breaker = breaker();
        breaker.isolate();
        assert_eq!(breaker.try_acquire(), Err(PipelineFault::IsolatedCircuit));
        breaker.reset();
        assert!(breaker.try_acquire().is_ok());
    }
}
