//! Bounded, fixed-interval retry while the host is not ready.

use std::time::Duration;

/// What to do after a failed readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Retry counter with a fixed backoff.
#[derive(Debug, Clone)]
pub struct Retry {
    interval: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Retry {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            attempts: 0,
        }
    }

    /// Record a failed attempt and decide whether to try again.
    pub fn failed(&mut self) -> RetryDecision {
        self.attempts = self.attempts.saturating_add(1);
        if self.attempts >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.interval)
        }
    }

    /// Failed attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
