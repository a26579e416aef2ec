// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::SchedulerSettings;
use crate::engine::core::{ResultDecision, SchedulerCore, SchedulerSnapshot, TriggerDecision};
use crate::exec::BuildRunner;
use crate::types::TriggerEvent;

/// Async shell around [`SchedulerCore`].
///
/// One instance is built at startup and cloned into every listener task.
/// All state, the single deferred-run timer, and the build itself live
/// behind one `tokio::sync::Mutex`, so trigger handling, timer firing and
/// result recording never interleave and at most one build runs at a time.
pub struct Scheduler<R: BuildRunner> {
    shared: Arc<Shared<R>>,
}

struct Shared<R> {
    runner: R,
    state: Mutex<Locked>,
}

struct Locked {
    core: SchedulerCore,
    /// Task sleeping until `core.next_run()`. Set iff that is `Some`.
    timer: Option<JoinHandle<()>>,
}

impl Locked {
    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.core.next_run().is_some(),
            self.timer.is_some(),
            "next_run and timer handle out of sync"
        );
    }
}

impl<R: BuildRunner> Clone for Scheduler<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: BuildRunner> fmt::Debug for Scheduler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler").finish_non_exhaustive()
    }
}

impl<R: BuildRunner> Scheduler<R> {
    pub fn new(settings: SchedulerSettings, runner: R) -> Self {
        Self {
            shared: Arc::new(Shared {
                runner,
                state: Mutex::new(Locked {
                    core: SchedulerCore::new(settings),
                    timer: None,
                }),
            }),
        }
    }

    /// Copy of the current state. Waits for any build in progress.
    pub async fn snapshot(&self) -> SchedulerSnapshot {
        self.shared.state.lock().await.core.snapshot()
    }

    /// Decide what to do with one trigger: build now, arm the deferred run,
    /// or fold it into the run that is already armed.
    ///
    /// When the decision is to build now, this returns after the build
    /// finished and its result was recorded.
    pub async fn handle_trigger(&self, event: TriggerEvent) {
        let mut locked = self.shared.state.lock().await;

        debug!(
            source = %event.source,
            state = ?locked.core.snapshot(),
            "trigger received"
        );

        match locked.core.on_trigger(event.arrived_at) {
            TriggerDecision::RunNow => {
                locked.cancel_timer();
                info!(source = %event.source, "running build immediately");
                self.run_build(&mut locked).await;
            }
            TriggerDecision::Schedule { at, generation } => {
                self.arm_timer(&mut locked, at, generation);
                debug!(
                    source = %event.source,
                    next_run_in_ms = millis_until(at),
                    "build scheduled at end of debounce window"
                );
            }
            TriggerDecision::Coalesce { at } => {
                debug!(
                    source = %event.source,
                    next_run_in_ms = millis_until(at),
                    "trigger coalesced into scheduled build"
                );
            }
        }

        locked.check_invariants();
    }

    async fn on_timer(&self, generation: u64) {
        let mut locked = self.shared.state.lock().await;

        if !locked.core.on_timer_fired(generation) {
            debug!(generation, "ignoring superseded timer");
            return;
        }
        // This task is the timer; detach the handle rather than abort it.
        locked.timer = None;

        info!(generation, "deferred build firing");
        self.run_build(&mut locked).await;
        locked.check_invariants();
    }

    fn arm_timer(&self, locked: &mut Locked, at: Instant, generation: u64) {
        locked.cancel_timer();

        let scheduler = self.clone();
        locked.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(at).await;
            scheduler.on_timer(generation).await;
        }));
    }

    async fn run_build(&self, locked: &mut Locked) {
        let started = Instant::now();
        let outcome = self.shared.runner.execute().await;
        let finished = Instant::now();
        let elapsed_ms = finished.duration_since(started).as_millis() as u64;

        if outcome.succeeded() {
            info!(elapsed_ms, "build succeeded");
        } else if let Some(code) = outcome.exit_code() {
            warn!(elapsed_ms, exit_code = code, "build failed");
        } else if let Some(msg) = outcome.execution_error() {
            warn!(elapsed_ms, error = %msg, "build could not be executed");
        }

        match locked.core.on_result(finished, &outcome) {
            ResultDecision::Idle => {}
            ResultDecision::Retry {
                at,
                generation,
                attempt,
            } => {
                self.arm_timer(locked, at, generation);
                warn!(
                    retry_count = attempt,
                    max_retries = locked.core.settings().max_retries,
                    next_run_in_ms = millis_until(at),
                    "retry scheduled"
                );
            }
            ResultDecision::Exhausted => {
                warn!(
                    retry_count = locked.core.retry_count(),
                    "max retries reached, check the build setup; waiting for next trigger"
                );
            }
        }
    }
}

fn millis_until(at: Instant) -> u64 {
    at.saturating_duration_since(Instant::now()).as_millis() as u64
}
