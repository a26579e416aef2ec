// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::warn;

use crate::cli::CliArgs;
use crate::config::model::{
    DEFAULT_BUILD_CMD, DEFAULT_DEBOUNCE_SECS, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_RESET_SECS,
    DEFAULT_TCP_ADDR, DEFAULT_UNIX_SOCKET, DaemonConfig, MIN_DEBOUNCE_SECS, RawConfigFile,
};
use crate::engine::{MAX_DEBOUNCE, SchedulerSettings};
use crate::signal::Endpoint;

/// Merge defaults, file and CLI values, then validate the result.
///
/// This checks:
/// - the build command is not blank
/// - the debounce period is at most [`MAX_DEBOUNCE`]
/// - the retry-reset period is non-zero
/// - the socket path is set and the network address looks like `host:port`
///
/// A debounce period below the minimum is not an error: it is raised to
/// [`MIN_DEBOUNCE_SECS`] and a warning is logged.
pub fn resolve_config(file: &RawConfigFile, args: &CliArgs) -> Result<DaemonConfig> {
    let d = &file.daemon;

    let debounce_secs = clamp_debounce(
        args.debounce_secs
            .or(d.debounce_secs)
            .unwrap_or(DEFAULT_DEBOUNCE_SECS),
    );
    let max_retries = args
        .max_retries
        .or(d.max_retries)
        .unwrap_or(DEFAULT_MAX_RETRIES);
    let retry_reset_secs = args
        .retry_reset_secs
        .or(d.retry_reset_secs)
        .unwrap_or(DEFAULT_RETRY_RESET_SECS);
    let build_cmd = args
        .build_cmd
        .clone()
        .or_else(|| d.build_cmd.clone())
        .unwrap_or_else(|| DEFAULT_BUILD_CMD.to_string());
    let build_timeout_secs = args.build_timeout_secs.or(d.build_timeout_secs);
    let unix_socket = args
        .unix_socket
        .clone()
        .or_else(|| d.unix_socket.clone())
        .unwrap_or_else(|| DEFAULT_UNIX_SOCKET.to_string());
    let tcp_addr = args
        .tcp_addr
        .clone()
        .or_else(|| d.tcp_addr.clone())
        .unwrap_or_else(|| DEFAULT_TCP_ADDR.to_string());

    let config = DaemonConfig {
        scheduler: SchedulerSettings {
            debounce: Duration::from_secs(debounce_secs),
            max_retries,
            retry_reset: Duration::from_secs(retry_reset_secs),
        },
        build_cmd,
        build_timeout: build_timeout_secs.map(Duration::from_secs),
        unix_socket: PathBuf::from(unix_socket),
        tcp_addr,
    };

    validate_config(&config)?;
    Ok(config)
}

/// Semantic checks on an already-merged configuration.
pub fn validate_config(cfg: &DaemonConfig) -> Result<()> {
    ensure_build_cmd(cfg)?;
    ensure_debounce(cfg)?;
    ensure_retry_reset(cfg)?;
    ensure_build_timeout(cfg)?;
    validate_endpoints(cfg)?;
    Ok(())
}

fn clamp_debounce(secs: u64) -> u64 {
    if secs < MIN_DEBOUNCE_SECS {
        warn!(
            requested_secs = secs,
            adjusted_secs = MIN_DEBOUNCE_SECS,
            "debounce period adjusted to minimum"
        );
        MIN_DEBOUNCE_SECS
    } else {
        secs
    }
}

fn ensure_build_cmd(cfg: &DaemonConfig) -> Result<()> {
    if cfg.build_cmd.trim().is_empty() {
        return Err(anyhow!("build command must not be empty"));
    }
    Ok(())
}

fn ensure_debounce(cfg: &DaemonConfig) -> Result<()> {
    if cfg.scheduler.debounce > MAX_DEBOUNCE {
        return Err(anyhow!(
            "debounce period must be <= {} seconds (got {})",
            MAX_DEBOUNCE.as_secs(),
            cfg.scheduler.debounce.as_secs()
        ));
    }
    Ok(())
}

fn ensure_retry_reset(cfg: &DaemonConfig) -> Result<()> {
    if cfg.scheduler.retry_reset.is_zero() {
        return Err(anyhow!("retry-reset period must be >= 1 second (got 0)"));
    }
    Ok(())
}

fn ensure_build_timeout(cfg: &DaemonConfig) -> Result<()> {
    if cfg.build_timeout.is_some_and(|t| t.is_zero()) {
        return Err(anyhow!("build timeout must be >= 1 second when set (got 0)"));
    }
    Ok(())
}

fn validate_endpoints(cfg: &DaemonConfig) -> Result<()> {
    if cfg.unix_socket.as_os_str().is_empty() {
        return Err(anyhow!("unix socket path must not be empty"));
    }

    Endpoint::parse(&format!("tcp:{}", cfg.tcp_addr))
        .map_err(|_| anyhow!("invalid tcp address '{}' (expected host:port)", cfg.tcp_addr))?;
    Ok(())
}
