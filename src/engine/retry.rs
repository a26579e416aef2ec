// src/engine/retry.rs

//! Bounded, time-decaying failure counter.

use std::time::Duration;

use tokio::time::Instant;

/// Tracks consecutive build failures.
///
/// `count` never exceeds the `max_retries` passed to [`record_failure`],
/// and a quiet period longer than the reset period forgives everything.
///
/// [`record_failure`]: RetryPolicy::record_failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    count: u32,
    last_failure: Option<Instant>,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }

    /// Forget past failures if the last one is older than `reset_period`.
    ///
    /// Returns `true` when a reset happened.
    pub fn maybe_reset(&mut self, now: Instant, reset_period: Duration) -> bool {
        match self.last_failure {
            Some(at) if now.saturating_duration_since(at) > reset_period => {
                self.count = 0;
                self.last_failure = None;
                true
            }
            _ => false,
        }
    }

    /// Record a failed build at `now`.
    ///
    /// Returns `true` if another automatic attempt is allowed. When the cap
    /// is already reached the state is left untouched.
    pub fn record_failure(&mut self, now: Instant, max_retries: u32) -> bool {
        if self.count < max_retries {
            self.count += 1;
            self.last_failure = Some(now);
            true
        } else {
            false
        }
    }

    pub fn record_success(&mut self) {
        self.count = 0;
        self.last_failure = None;
    }
}
