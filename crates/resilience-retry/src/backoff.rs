use std::time::Duration;

/// Decorrelated-jitter backoff as used by the source system:
///
/// ```text
/// current_0 = seed
/// current_n = min(max, max(seed, current_n-1 * 3 * U(0,1)))
/// ```
///
/// Unlike a plain exponential backoff this keeps successive delays
/// decorrelated from each other, so a burst of retrying callers doesn't
/// converge back onto the same cadence the way fixed or purely
/// multiplicative backoff does.
#[derive(Debug, Clone, Copy)]
pub struct DecorrelatedJitter {
    seed_ms: f64,
    max_ms: f64,
    current_ms: f64,
}

impl DecorrelatedJitter {
    pub fn new(seed: Duration, max: Duration) -> Self {
        let seed_ms = seed.as_secs_f64() * 1000.0;
        let max_ms = max.as_secs_f64() * 1000.0;
        Self {
            seed_ms,
            max_ms,
            current_ms: seed_ms,
        }
    }

    /// Advances the sequence by one step and returns the delay to wait
    /// before the next attempt. `draw` is the uniform `U(0,1)` sample;
    /// callers pass their own RNG draw so the sequence is testable.
    pub fn next_delay(&mut self, draw: f64) -> Duration {
        let candidate = self.current_ms * 3.0 * draw;
        self.current_ms = candidate.max(self.seed_ms).min(self.max_ms);
        Duration::from_secs_f64(self.current_ms / 1000.0)
    }
}
