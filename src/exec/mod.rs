// src/exec/mod.rs

//! Build execution layer.
//!
//! - [`backend`] provides the `BuildRunner` trait and the production
//!   `ShellBuildRunner`; tests substitute a fake runner.
//! - [`command`] runs the shell instruction with `tokio::process::Command`
//!   and maps the exit status to a [`crate::types::BuildOutcome`].

pub mod backend;
pub mod command;

pub use backend::{BuildRunner, ShellBuildRunner};
pub use command::run_build_command;
