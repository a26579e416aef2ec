// src/exec/command.rs

//! Build process execution.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::types::BuildOutcome;

/// Run `cmd` through the shell and wait for it.
///
/// Never fails: a process that cannot be started (or cannot be waited on)
/// becomes [`BuildOutcome::ExecError`], a nonzero exit becomes
/// [`BuildOutcome::Failed`]. When `timeout` elapses the shell's whole
/// process group is killed and the outcome is an `ExecError` as well.
pub async fn run_build_command(cmd: &str, timeout: Option<Duration>) -> BuildOutcome {
    match run_build_inner(cmd, timeout).await {
        Ok(outcome) => outcome,
        Err(err) => {
            let msg = format!("{err:#}");
            error!(cmd = %cmd, error = %msg, "build execution error");
            BuildOutcome::ExecError(msg)
        }
    }
}

async fn run_build_inner(cmd_str: &str, timeout: Option<Duration>) -> Result<BuildOutcome> {
    info!(cmd = %cmd_str, "starting build process");

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(cmd_str)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning build command '{cmd_str}'"))?;

    // Always consume output so pipe buffers never fill up.
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(log_lines(stdout, "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(log_lines(stderr, "stderr"));
    }

    let status = match timeout {
        None => child.wait().await.context("waiting for build process")?,
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status.context("waiting for build process")?,
            Err(_) => {
                warn!(
                    cmd = %cmd_str,
                    timeout_secs = limit.as_secs(),
                    "build exceeded timeout; killing process"
                );
                kill_process_group(&mut child).await;
                return Ok(BuildOutcome::ExecError(format!(
                    "build timed out after {}s",
                    limit.as_secs()
                )));
            }
        },
    };

    let code = status.code().unwrap_or(-1);
    info!(exit_code = code, success = status.success(), "build process exited");

    if status.success() {
        Ok(BuildOutcome::Success)
    } else {
        Ok(BuildOutcome::Failed(code))
    }
}

/// Kill everything the shell started, not just the shell, then reap it.
async fn kill_process_group(child: &mut tokio::process::Child) {
    if let Some(pid) = child.id() {
        // The child leads its own group (`process_group(0)`), so pgid == pid.
        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            warn!(pid, error = %e, "failed to kill build process group");
        }
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to reap timed-out build process");
    }
}

async fn log_lines<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(stream, "build: {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_exit_is_success() {
        assert_eq!(run_build_command("true", None).await, BuildOutcome::Success);
    }

    #[tokio::test]
    async fn nonzero_exit_keeps_code() {
        assert_eq!(
            run_build_command("echo oops >&2; exit 3", None).await,
            BuildOutcome::Failed(3)
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_failed_exit_from_the_shell() {
        // `sh` itself starts fine and reports 127 for an unknown command.
        assert_eq!(
            run_build_command("definitely-not-a-real-binary-xyz", None).await,
            BuildOutcome::Failed(127)
        );
    }

    #[tokio::test]
    async fn watchdog_kills_hung_build() {
        let outcome = run_build_command("sleep 5", Some(Duration::from_millis(100))).await;
        match outcome {
            BuildOutcome::ExecError(msg) => assert!(msg.contains("timed out")),
            other => panic!("expected ExecError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn watchdog_kills_processes_forked_by_the_shell() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join("finished");
        let cmd = format!("cd /tmp && (sleep 1; touch '{}'); true", marker.display());

        let outcome = run_build_command(&cmd, Some(Duration::from_millis(200))).await;
        assert!(matches!(outcome, BuildOutcome::ExecError(_)));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "subshell outlived the timed-out build");
    }
}
