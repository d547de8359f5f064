use resilience_core::EventListeners;
use std::time::Duration;

use crate::events::TimeLimiterEvent;

pub struct TimeLimiterConfig {
    pub name: String,
    pub timeout_duration: Duration,
    pub event_listeners: EventListeners<TimeLimiterEvent>,
}

pub struct TimeLimiterConfigBuilder {
    name: String,
    timeout_duration: Duration,
    event_listeners: EventListeners<TimeLimiterEvent>,
}

impl TimeLimiterConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timeout_duration: Duration::from_secs(1),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn timeout_duration(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn event_listeners(mut self, listeners: EventListeners<TimeLimiterEvent>) -> Self {
        self.event_listeners = listeners;
        self
    }

    pub fn build(self) -> TimeLimiterConfig {
        TimeLimiterConfig {
            name: self.name,
            timeout_duration: self.timeout_duration,
            event_listeners: self.event_listeners,
        }
    }
}
