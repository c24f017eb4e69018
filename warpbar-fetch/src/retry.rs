//! Retry strategy for preferences reads.

use std::time::Duration;

/// Strategy for retrying failed load attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Maximum number of attempts per load cycle (including the first).
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Creates a new retry strategy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Attempts per cycle, never less than one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Calculates the delay after a failed attempt (1-based).
    ///
    /// `base * 2^(attempt-1)`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another attempt follows a failure of `attempt`.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}
