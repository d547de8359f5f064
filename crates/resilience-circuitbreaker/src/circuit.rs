use crate::config::{CircuitBreakerConfig, SlidingWindowType};
use crate::events::CircuitBreakerEvent;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The circuit's admission state.
///
/// `Isolated` has no equivalent open/closed transition: it is entered
/// and left only by an explicit admin call (`CircuitBreakerStrategy::isolate`
/// / `reset`), never by the sliding-window evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
    Isolated = 3,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            3 => CircuitState::Isolated,
            _ => CircuitState::Closed,
        }
    }
}

/// Point-in-time snapshot of a circuit's window statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub total_calls: usize,
    pub failure_count: usize,
    pub success_count: usize,
    pub slow_call_count: usize,
    pub failure_rate: f64,
    pub slow_call_rate: f64,
    pub time_since_state_change: Duration,
}

#[derive(Debug, Clone)]
struct CallRecord {
    timestamp: Instant,
    is_failure: bool,
    is_slow: bool,
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    failure_count: usize,
    success_count: usize,
    total_count: usize,
    slow_call_count: usize,
    call_records: VecDeque<CallRecord>,
}

impl Circuit {
    pub(crate) fn new(state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            failure_count: 0,
            success_count: 0,
            total_count: 0,
            slow_call_count: 0,
            call_records: VecDeque::new(),
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn metrics(&self, config: &CircuitBreakerConfig) -> CircuitMetrics {
        let (total_calls, failure_count, success_count, slow_call_count) =
            match config.sliding_window_type {
                SlidingWindowType::CountBased => (
                    self.total_count,
                    self.failure_count,
                    self.success_count,
                    self.slow_call_count,
                ),
                SlidingWindowType::TimeBased => self.time_based_stats(),
            };

        let failure_rate = if total_calls > 0 {
            failure_count as f64 / total_calls as f64
        } else {
            0.0
        };
        let slow_call_rate = if total_calls > 0 {
            slow_call_count as f64 / total_calls as f64
        } else {
            0.0
        };

        CircuitMetrics {
            state: self.state,
            total_calls,
            failure_count,
            success_count,
            slow_call_count,
            failure_rate,
            slow_call_rate,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    fn cleanup_old_records(&mut self, window_duration: Duration) {
        let now = Instant::now();
        while let Some(record) = self.call_records.front() {
            if now.duration_since(record.timestamp) > window_duration {
                self.call_records.pop_front();
            } else {
                break;
            }
        }
    }

    fn time_based_stats(&self) -> (usize, usize, usize, usize) {
        let mut total = 0;
        let mut failures = 0;
        let mut successes = 0;
        let mut slow = 0;
        for record in &self.call_records {
            total += 1;
            if record.is_failure {
                failures += 1;
            } else {
                successes += 1;
            }
            if record.is_slow {
                slow += 1;
            }
        }
        (total, failures, successes, slow)
    }

    /// Records a non-failing outcome (an `Ok`, or a fault the classifier
    /// decided is not circuit-breakable).
    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig, duration: Duration) {
        if self.state == CircuitState::Isolated {
            return;
        }
        let is_slow = config
            .slow_call_duration_threshold
            .map(|threshold| duration >= threshold)
            .unwrap_or(false);

        match config.sliding_window_type {
            SlidingWindowType::CountBased => {
                self.success_count += 1;
                self.total_count += 1;
                if is_slow {
                    self.slow_call_count += 1;
                }
            }
            SlidingWindowType::TimeBased => {
                if let Some(window_duration) = config.sliding_window_duration {
                    self.cleanup_old_records(window_duration);
                    self.call_records.push_back(CallRecord {
                        timestamp: Instant::now(),
                        is_failure: false,
                        is_slow,
                    });
                }
            }
        }

        if is_slow {
            config.event_listeners.emit(&CircuitBreakerEvent::SlowCallDetected {
                operation_key: config.name.clone(),
                state: self.state,
                duration,
                timestamp: Instant::now(),
            });
            #[cfg(feature = "metrics")]
            counter!("resilience_circuitbreaker_slow_calls_total", "name" => config.name.clone())
                .increment(1);
        }

        config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            operation_key: config.name.clone(),
            state: self.state,
            timestamp: Instant::now(),
        });

        match self.state {
            CircuitState::HalfOpen => {
                let success_count = match config.sliding_window_type {
                    SlidingWindowType::CountBased => self.success_count,
                    SlidingWindowType::TimeBased => self.time_based_stats().2,
                };
                if success_count >= config.permitted_calls_in_half_open {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            _ => self.evaluate_window(config),
        }
    }

    /// Records a circuit-breakable failure.
    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig, duration: Duration) {
        if self.state == CircuitState::Isolated {
            return;
        }
        let is_slow = config
            .slow_call_duration_threshold
            .map(|threshold| duration >= threshold)
            .unwrap_or(false);

        match config.sliding_window_type {
            SlidingWindowType::CountBased => {
                self.failure_count += 1;
                self.total_count += 1;
                if is_slow {
                    self.slow_call_count += 1;
                }
            }
            SlidingWindowType::TimeBased => {
                if let Some(window_duration) = config.sliding_window_duration {
                    self.cleanup_old_records(window_duration);
                    self.call_records.push_back(CallRecord {
                        timestamp: Instant::now(),
                        is_failure: true,
                        is_slow,
                    });
                }
            }
        }

        if is_slow {
            config.event_listeners.emit(&CircuitBreakerEvent::SlowCallDetected {
                operation_key: config.name.clone(),
                state: self.state,
                duration,
                timestamp: Instant::now(),
            });
            #[cfg(feature = "metrics")]
            counter!("resilience_circuitbreaker_slow_calls_total", "name" => config.name.clone())
                .increment(1);
        }

        config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            operation_key: config.name.clone(),
            state: self.state,
            timestamp: Instant::now(),
        });

        match self.state {
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open, config),
            _ => self.evaluate_window(config),
        }
    }

    /// `true` if a call should be admitted right now. A transition out of
    /// `Open` into `HalfOpen` happens here, lazily, on the first admission
    /// check after `wait_duration_in_open` has elapsed.
    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Isolated => {
                config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
                    operation_key: config.name.clone(),
                    state: self.state,
                    timestamp: Instant::now(),
                });
                false
            }
            CircuitState::Closed => {
                config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
                    operation_key: config.name.clone(),
                    state: self.state,
                    timestamp: Instant::now(),
                });
                true
            }
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= config.wait_duration_in_open {
                    self.transition_to(CircuitState::HalfOpen, config);
                    config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
                        operation_key: config.name.clone(),
                        state: self.state,
                        timestamp: Instant::now(),
                    });
                    true
                } else {
                    config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
                        operation_key: config.name.clone(),
                        state: self.state,
                        timestamp: Instant::now(),
                    });
                    false
                }
            }
            CircuitState::HalfOpen => {
                let permitted =
                    self.success_count + self.failure_count < config.permitted_calls_in_half_open;
                let event = if permitted {
                    CircuitBreakerEvent::CallPermitted {
                        operation_key: config.name.clone(),
                        state: self.state,
                        timestamp: Instant::now(),
                    }
                } else {
                    CircuitBreakerEvent::CallRejected {
                        operation_key: config.name.clone(),
                        state: self.state,
                        timestamp: Instant::now(),
                    }
                };
                config.event_listeners.emit(&event);
                permitted
            }
        }
    }

    pub(crate) fn isolate(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Isolated, config);
    }

    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }
        let from_state = self.state;

        config.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            operation_key: config.name.clone(),
            from_state,
            to_state: state,
            timestamp: Instant::now(),
        });

        #[cfg(feature = "tracing")]
        tracing::info!(name = %config.name, from = ?from_state, to = ?state, "circuit breaker state transition");

        #[cfg(feature = "metrics")]
        {
            let state_label = |s: CircuitState| match s {
                CircuitState::Closed => "closed",
                CircuitState::Open => "open",
                CircuitState::HalfOpen => "half_open",
                CircuitState::Isolated => "isolated",
            };
            counter!(
                "resilience_circuitbreaker_transitions_total",
                "name" => config.name.clone(),
                "from" => state_label(from_state),
                "to" => state_label(state)
            )
            .increment(1);
            gauge!("resilience_circuitbreaker_state", "name" => config.name.clone())
                .set(state as u8 as f64);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.success_count = 0;
        self.failure_count = 0;
        self.total_count = 0;
        self.slow_call_count = 0;
        self.call_records.clear();
    }

    fn evaluate_window(&mut self, config: &CircuitBreakerConfig) {
        let (total_count, failure_count, _success_count, slow_call_count) =
            match config.sliding_window_type {
                SlidingWindowType::CountBased => (
                    self.total_count,
                    self.failure_count,
                    self.success_count,
                    self.slow_call_count,
                ),
                SlidingWindowType::TimeBased => {
                    if let Some(window_duration) = config.sliding_window_duration {
                        self.cleanup_old_records(window_duration);
                    }
                    self.time_based_stats()
                }
            };

        if total_count < config.minimum_number_of_calls {
            return;
        }
        if config.sliding_window_type == SlidingWindowType::CountBased
            && total_count < config.sliding_window_size
        {
            return;
        }

        let failure_rate = failure_count as f64 / total_count as f64;
        let slow_call_rate = slow_call_count as f64 / total_count as f64;

        let should_open = failure_rate >= config.failure_rate_threshold
            || (config.slow_call_duration_threshold.is_some()
                && slow_call_rate >= config.slow_call_rate_threshold);

        if should_open {
            self.transition_to(CircuitState::Open, config);
        }
    }
}
