use resilience_core::EventListeners;
use std::time::Duration;

use crate::events::RetryEvent;

/// Static configuration for one endpoint's retry strategy.
pub struct RetryConfig {
    pub name: String,
    /// Number of retries permitted; total executions are at most
    /// `retries + 1`. `0` disables the strategy entirely.
    pub retries: usize,
    pub delay_seed: Duration,
    pub delay_maximum: Duration,
    pub event_listeners: EventListeners<RetryEvent>,
}

pub struct RetryConfigBuilder {
    name: String,
    retries: usize,
    delay_seed: Duration,
    delay_maximum: Duration,
    event_listeners: EventListeners<RetryEvent>,
}

impl RetryConfigBuilder {
    /// Defaults: 0 retries (disabled), 200ms seed, 2s maximum delay.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            retries: 0,
            delay_seed: Duration::from_millis(200),
            delay_maximum: Duration::from_secs(2),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn delay_seed(mut self, delay: Duration) -> Self {
        self.delay_seed = delay;
        self
    }

    pub fn delay_maximum(mut self, delay: Duration) -> Self {
        self.delay_maximum = delay;
        self
    }

    pub fn event_listeners(mut self, listeners: EventListeners<RetryEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    pub fn build(self) -> RetryConfig {
        RetryConfig {
            name: self.name,
            retries: self.retries,
            delay_seed: self.delay_seed,
            delay_maximum: self.delay_maximum,
            event_listeners: self.event_listeners,
        }
    }
}
