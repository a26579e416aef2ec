// src/engine/core.rs

//! Pure scheduler state machine.
//!
//! `SchedulerCore` owns every piece of scheduling state (last success,
//! the armed deferred run, the retry counter) and turns inputs into
//! decisions. It never sleeps, spawns, or runs processes; the async
//! shell in [`super::scheduler`] does that and keeps its single timer
//! handle in step with [`SchedulerCore::next_run`].
//!
//! Instants are passed in by the caller, so the core can be driven with
//! synthetic times in tests.

use tokio::time::Instant;
use tracing::debug;

use crate::engine::{MAX_DEBOUNCE, SchedulerSettings};
use crate::engine::retry::RetryPolicy;
use crate::types::BuildOutcome;

/// What the shell should do with a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Cancel any armed timer and build right now.
    RunNow,
    /// Arm a timer for `at`. `generation` identifies it.
    Schedule { at: Instant, generation: u64 },
    /// A run is already armed for `at`; nothing to do.
    Coalesce { at: Instant },
}

/// What the shell should do after a build finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultDecision {
    /// Build succeeded; back to idle.
    Idle,
    /// Build failed and another automatic attempt is allowed.
    Retry {
        at: Instant,
        generation: u64,
        attempt: u32,
    },
    /// Build failed and the retry cap is reached. Only a fresh external
    /// trigger starts another build.
    Exhausted,
}

/// Coarse state for diagnostics. `Running` is not represented: a build
/// only runs while the scheduler lock is held, so nobody can observe it
/// through a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Scheduled,
}

/// Copy of the scheduling state at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSnapshot {
    pub phase: SchedulerPhase,
    pub last_success: Option<Instant>,
    pub next_run: Option<Instant>,
    pub retry_count: u32,
    pub last_failure: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedRun {
    at: Instant,
    generation: u64,
}

#[derive(Debug)]
pub struct SchedulerCore {
    settings: SchedulerSettings,
    last_success: Option<Instant>,
    armed: Option<ArmedRun>,
    retry: RetryPolicy,
    /// Monotonically increasing timer generation.
    generation_counter: u64,
}

impl SchedulerCore {
    pub fn new(mut settings: SchedulerSettings) -> Self {
        settings.debounce = settings.debounce.min(MAX_DEBOUNCE);
        Self {
            settings,
            last_success: None,
            armed: None,
            retry: RetryPolicy::new(),
            generation_counter: 0,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    pub fn next_run(&self) -> Option<Instant> {
        self.armed.map(|a| a.at)
    }

    pub fn retry_count(&self) -> u32 {
        self.retry.count()
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            phase: if self.armed.is_some() {
                SchedulerPhase::Scheduled
            } else {
                SchedulerPhase::Idle
            },
            last_success: self.last_success,
            next_run: self.next_run(),
            retry_count: self.retry.count(),
            last_failure: self.retry.last_failure(),
        }
    }

    /// Decide what to do with a trigger that arrived at `now`.
    ///
    /// The retry-reset check runs first, so a long quiet period forgives
    /// old failures before the decision is made.
    pub fn on_trigger(&mut self, now: Instant) -> TriggerDecision {
        self.apply_retry_reset(now);

        let last_success = match self.last_success {
            Some(t) if now.saturating_duration_since(t) <= self.settings.debounce => t,
            _ => {
                self.armed = None;
                return TriggerDecision::RunNow;
            }
        };

        if let Some(armed) = self.armed {
            return TriggerDecision::Coalesce { at: armed.at };
        }

        // Anchored to the last success, not to this trigger.
        let at = last_success + self.settings.debounce;
        let generation = self.arm(at);
        TriggerDecision::Schedule { at, generation }
    }

    /// A timer with `generation` fired. Returns `true` if it is still the
    /// armed one and the build should run; the armed run is consumed.
    pub fn on_timer_fired(&mut self, generation: u64) -> bool {
        match self.armed {
            Some(armed) if armed.generation == generation => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    /// Record the outcome of a build that finished at `now`.
    pub fn on_result(&mut self, now: Instant, outcome: &BuildOutcome) -> ResultDecision {
        if outcome.succeeded() {
            self.last_success = Some(match self.last_success {
                Some(prev) => prev.max(now),
                None => now,
            });
            self.armed = None;
            self.retry.record_success();
            return ResultDecision::Idle;
        }

        self.apply_retry_reset(now);

        if self.retry.record_failure(now, self.settings.max_retries) {
            let at = now + self.settings.debounce;
            let generation = self.arm(at);
            ResultDecision::Retry {
                at,
                generation,
                attempt: self.retry.count(),
            }
        } else {
            ResultDecision::Exhausted
        }
    }

    fn arm(&mut self, at: Instant) -> u64 {
        self.generation_counter += 1;
        self.armed = Some(ArmedRun {
            at,
            generation: self.generation_counter,
        });
        self.generation_counter
    }

    fn apply_retry_reset(&mut self, now: Instant) {
        if self.retry.maybe_reset(now, self.settings.retry_reset) {
            debug!(
                reset_after_secs = self.settings.retry_reset.as_secs(),
                "retry count reset after quiet period"
            );
        }
    }
}
