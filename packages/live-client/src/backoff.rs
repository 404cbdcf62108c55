//! Reconnect delay policy

use std::time::Duration;

use coursehub_shared_config::LiveConfig;

/// Default delay step between reconnect attempts (milliseconds)
const DEFAULT_BASE_DELAY_MS: u64 = 2_000;

/// Default ceiling for a single reconnect delay (milliseconds)
const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Linear reconnect backoff: `min(base * attempt, max)`, no jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
            max_attempts: None,
        }
    }

    /// Stop retrying after `max_attempts` consecutive failures
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn from_config(config: &LiveConfig) -> Self {
        Self::new(config.reconnect_base_delay, config.reconnect_max_delay)
            .with_max_attempts(config.reconnect_max_attempts)
    }

    /// Delay before retry number `attempt` (1 for the first retry)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(attempt)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Whether `attempt` is past the retry budget
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt > max)
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        )
    }
}
