use std::time::Duration;

/// Exponential backoff state owned by a single refresh loop.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Double the delay, capped at `max`, and return the new value.
    pub fn on_failure(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.max);
        self.current
    }

    /// Back to the initial delay after a success.
    pub fn reset(&mut self) -> Duration {
        self.current = self.initial;
        self.current
    }
}
