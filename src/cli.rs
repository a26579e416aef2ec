// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `rebuildd`.
///
/// Every scheduling option is optional here so that values from a
/// `--config` file are only overridden when a flag is actually given.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "rebuildd",
    version,
    about = "Coalesce rebuild triggers from socket connections into debounced builds.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional TOML config file with a `[daemon]` section.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Debounce period in seconds (minimum 180).
    #[arg(short = 't', long, value_name = "SECS")]
    pub debounce_secs: Option<u64>,

    /// Maximum automatic retries after a failed build.
    #[arg(long = "max-retry", value_name = "N")]
    pub max_retries: Option<u32>,

    /// Seconds without a failure after which the retry count is reset.
    #[arg(long = "retry-period", value_name = "SECS")]
    pub retry_reset_secs: Option<u64>,

    /// Shell instruction that performs the rebuild (run via `sh -c`).
    #[arg(long, value_name = "CMD")]
    pub build_cmd: Option<String>,

    /// Kill the build command if it runs longer than this.
    #[arg(long, value_name = "SECS")]
    pub build_timeout_secs: Option<u64>,

    /// Local trigger socket path.
    #[arg(long, value_name = "PATH")]
    pub unix_socket: Option<String>,

    /// Network trigger address (host:port).
    #[arg(long, value_name = "ADDR")]
    pub tcp_addr: Option<String>,

    /// Enable debug logging.
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `-d`, `REBUILDD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, then exit without listening.
    #[arg(long)]
    pub dry_run: bool,

    /// Send one trigger to TARGET (`unix:/path` or `tcp:host:port`) and exit.
    #[arg(long, value_name = "TARGET")]
    pub send: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
