// src/engine/mod.rs

//! Trigger-coalescing build scheduler.
//!
//! - [`core`]: the pure debounce/retry state machine.
//! - [`retry`]: the bounded, time-decaying failure counter.
//! - [`scheduler`]: the async shell that serializes triggers, timer
//!   callbacks and builds behind one lock.

use std::time::Duration;

/// Longest debounce period the scheduler will use (30 days). Larger
/// values are clamped so deadline arithmetic cannot overflow.
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(30 * 24 * 3600);

/// Immutable scheduling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Minimum spacing between a successful build and the next immediate
    /// one; also the delay for deferred runs and retries.
    pub debounce: Duration,
    /// Automatic retries allowed after consecutive failures.
    pub max_retries: u32,
    /// Quiet period after which past failures are forgotten.
    pub retry_reset: Duration,
}

pub mod core;
pub mod retry;
pub mod scheduler;

pub use self::core::{
    ResultDecision, SchedulerCore, SchedulerPhase, SchedulerSnapshot, TriggerDecision,
};
pub use retry::RetryPolicy;
pub use scheduler::Scheduler;
