// src/types.rs

use std::fmt;

use tokio::time::Instant;

/// Which listener endpoint a trigger arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerSource {
    /// Local-only channel (unix domain socket).
    Local,
    /// Network-reachable channel (TCP).
    Network,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Local => f.write_str("local"),
            TriggerSource::Network => f.write_str("network"),
        }
    }
}

/// A "content changed" signal.
///
/// Carries no payload: the connection itself was the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub source: TriggerSource,
    pub arrived_at: Instant,
}

impl TriggerEvent {
    pub fn new(source: TriggerSource, arrived_at: Instant) -> Self {
        Self { source, arrived_at }
    }

    /// Stamp a trigger with the current instant.
    pub fn now(source: TriggerSource) -> Self {
        Self::new(source, Instant::now())
    }
}

/// Outcome of one invocation of the build command.
///
/// Starting failures and nonzero exits are both failures, but they are
/// kept apart so logs can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    /// Command ran and exited nonzero (or was killed by a signal: -1).
    Failed(i32),
    /// Command could not be started, or the watchdog killed it.
    ExecError(String),
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildOutcome::Success => Some(0),
            BuildOutcome::Failed(code) => Some(*code),
            BuildOutcome::ExecError(_) => None,
        }
    }

    pub fn execution_error(&self) -> Option<&str> {
        match self {
            BuildOutcome::ExecError(msg) => Some(msg),
            _ => None,
        }
    }
}
