// src/exec/backend.rs

//! Pluggable build runner abstraction.
//!
//! The scheduler talks to a `BuildRunner` instead of spawning processes
//! itself. Production uses [`ShellBuildRunner`]; tests can provide a runner
//! that returns scripted outcomes without touching the OS.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::types::BuildOutcome;

use super::command::run_build_command;

/// Trait abstracting how one rebuild is executed.
///
/// `execute` must run to completion; the scheduler holds its lock for the
/// whole call, so at most one build is ever in flight.
pub trait BuildRunner: Send + Sync + 'static {
    fn execute(&self) -> Pin<Box<dyn Future<Output = BuildOutcome> + Send + '_>>;
}

/// Runs the configured shell instruction via `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellBuildRunner {
    cmd: String,
    timeout: Option<Duration>,
}

impl ShellBuildRunner {
    pub fn new(cmd: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            cmd: cmd.into(),
            timeout,
        }
    }
}

impl BuildRunner for ShellBuildRunner {
    fn execute(&self) -> Pin<Box<dyn Future<Output = BuildOutcome> + Send + '_>> {
        Box::pin(run_build_command(&self.cmd, self.timeout))
    }
}
