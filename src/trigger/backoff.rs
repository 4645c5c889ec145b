//! Retry state machine for the trigger call

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            max_attempts: config.trigger_max_attempts.max(1),
            initial_delay: Duration::from_millis(config.trigger_backoff_ms),
            ..Default::default()
        }
    }
}

/// Attempt counter plus the delay to wait before the next attempt.
/// The delay doubles after every failure, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    failed_attempts: u32,
    next_delay: Duration,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        let next_delay = policy.initial_delay.min(policy.max_delay);
        Self { policy, failed_attempts: 0, next_delay }
    }

    /// Attempts that ended in a retryable failure so far
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Number of the attempt about to run, starting at 1
    pub fn current_attempt(&self) -> u32 {
        self.failed_attempts + 1
    }

    /// Record a retryable failure. Returns the delay before the next attempt,
    /// or `None` once the attempt budget is spent.
    pub fn on_failure(&mut self) -> Option<Duration> {
        self.failed_attempts += 1;
        if self.failed_attempts >= self.policy.max_attempts {
            return None;
        }

        let delay = self.next_delay;
        self.next_delay = (delay * 2).min(self.policy.max_delay);
        Some(delay)
    }

    pub fn is_exhausted(&self) -> bool {
        self.failed_attempts >= self.policy.max_attempts
    }
}
