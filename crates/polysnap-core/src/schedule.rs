//! Poll and debounce timing for reconciliation passes.
//!
//! Two triggers feed the same reconciliation function: a fixed poll
//! interval, and host notifications delayed by a short settle time so the
//! host's own state has caught up before it is sampled.

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Why a reconciliation pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The poll interval elapsed.
    Poll,
    /// A host notification settled.
    Notification,
}

/// Tracks when the next pass is due.
#[derive(Debug, Clone)]
pub struct Schedule {
    poll_interval: Duration,
    debounce: Duration,
    last_poll: Option<Instant>,
    /// Deadline of the pending notification pass, if any.
    pending: Option<Instant>,
}

impl Schedule {
    pub fn new(poll_interval: Duration, debounce: Duration) -> Self {
        Self {
            poll_interval,
            debounce,
            last_poll: None,
            pending: None,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Record a host notification. Each one pushes the pending deadline
    /// back, so a burst yields one pass once the last event has settled.
    pub fn notify(&mut self, now: Instant) {
        self.pending = Some(now + self.debounce);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume the trigger that is due at `now`, if any. A settled
    /// notification takes priority over the poll; either one restarts the
    /// poll interval since the pass samples fresh state.
    pub fn due(&mut self, now: Instant) -> Option<Trigger> {
        if let Some(deadline) = self.pending {
            if now >= deadline {
                self.pending = None;
                self.last_poll = Some(now);
                return Some(Trigger::Notification);
            }
        }

        let poll_due = match self.last_poll {
            Some(last) => now.duration_since(last) >= self.poll_interval,
            None => true,
        };
        if poll_due {
            self.last_poll = Some(now);
            return Some(Trigger::Poll);
        }

        None
    }

    /// Delay from `now` until the next trigger becomes due.
    pub fn next_wake(&self, now: Instant) -> Duration {
        let poll_at = match self.last_poll {
            Some(last) => last + self.poll_interval,
            None => now,
        };
        let wake_at = match self.pending {
            Some(deadline) if deadline < poll_at => deadline,
            _ => poll_at,
        };
        wake_at.saturating_duration_since(now)
    }
}
