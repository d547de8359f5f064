use resilience_core::EventListeners;
use std::time::Duration;

use crate::events::CircuitBreakerEvent;

/// Which kind of sliding window the circuit evaluates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidingWindowType {
    /// Evaluate over the last `sliding_window_size` calls.
    CountBased,
    /// Evaluate over calls observed in the trailing `sliding_window_duration`.
    TimeBased,
}

/// Static configuration for one endpoint-resource circuit breaker.
pub struct CircuitBreakerConfig {
    pub name: String,
    pub sliding_window_type: SlidingWindowType,
    pub sliding_window_size: usize,
    pub sliding_window_duration: Option<Duration>,
    pub minimum_number_of_calls: usize,
    pub failure_rate_threshold: f64,
    pub slow_call_rate_threshold: f64,
    pub slow_call_duration_threshold: Option<Duration>,
    pub permitted_calls_in_half_open: usize,
    pub wait_duration_in_open: Duration,
    pub event_listeners: EventListeners<CircuitBreakerEvent>,
}

/// Builder for [`CircuitBreakerConfig`].
pub struct CircuitBreakerConfigBuilder {
    name: String,
    sliding_window_type: SlidingWindowType,
    sliding_window_size: usize,
    sliding_window_duration: Option<Duration>,
    minimum_number_of_calls: usize,
    failure_rate_threshold: f64,
    slow_call_rate_threshold: f64,
    slow_call_duration_threshold: Option<Duration>,
    permitted_calls_in_half_open: usize,
    wait_duration_in_open: Duration,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    /// Defaults: count-based window of 100 calls, minimum 10 calls before
    /// evaluation, 50% failure rate threshold, no slow-call detection,
    /// 1 permitted half-open probe, 60s wait in open.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sliding_window_type: SlidingWindowType::CountBased,
            sliding_window_size: 100,
            sliding_window_duration: None,
            minimum_number_of_calls: 10,
            failure_rate_threshold: 0.5,
            slow_call_rate_threshold: 1.0,
            slow_call_duration_threshold: None,
            permitted_calls_in_half_open: 1,
            wait_duration_in_open: Duration::from_secs(60),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn sliding_window_count_based(mut self, size: usize) -> Self {
        self.sliding_window_type = SlidingWindowType::CountBased;
        self.sliding_window_size = size;
        self
    }

    pub fn sliding_window_time_based(mut self, duration: Duration) -> Self {
        self.sliding_window_type = SlidingWindowType::TimeBased;
        self.sliding_window_duration = Some(duration);
        self
    }

    pub fn minimum_number_of_calls(mut self, n: usize) -> Self {
        self.minimum_number_of_calls = n;
        self
    }

    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate;
        self
    }

    pub fn slow_call_rate_threshold(mut self, rate: f64) -> Self {
        self.slow_call_rate_threshold = rate;
        self
    }

    pub fn slow_call_duration_threshold(mut self, threshold: Duration) -> Self {
        self.slow_call_duration_threshold = Some(threshold);
        self
    }

    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n;
        self
    }

    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open = duration;
        self
    }

    pub fn event_listeners(mut self, listeners: EventListeners<CircuitBreakerEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            name: self.name,
            sliding_window_type: self.sliding_window_type,
            sliding_window_size: self.sliding_window_size,
            sliding_window_duration: self.sliding_window_duration,
            minimum_number_of_calls: self.minimum_number_of_calls,
            failure_rate_threshold: self.failure_rate_threshold,
            slow_call_rate_threshold: self.slow_call_rate_threshold,
            slow_call_duration_threshold: self.slow_call_duration_threshold,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            wait_duration_in_open: self.wait_duration_in_open,
            event_listeners: self.event_listeners,
        }
    }
}
