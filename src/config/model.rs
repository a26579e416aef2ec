// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::SchedulerSettings;

/// Smallest accepted debounce period; lower values are raised to this.
pub const MIN_DEBOUNCE_SECS: u64 = 180;
pub const DEFAULT_DEBOUNCE_SECS: u64 = 300;
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_RESET_SECS: u64 = 3600;
pub const DEFAULT_BUILD_CMD: &str = "hugo --minify --noBuildLock --cleanDestinationDir";
pub const DEFAULT_UNIX_SOCKET: &str = "/tmp/rebuildd.sock";
pub const DEFAULT_TCP_ADDR: &str = "0.0.0.0:45718";

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [daemon]
/// debounce_secs = 300
/// max_retries = 1
/// retry_reset_secs = 3600
/// build_cmd = "cd ~/site && hugo --minify"
/// build_timeout_secs = 900
/// unix_socket = "/run/user/1000/rebuildd.sock"
/// tcp_addr = "127.0.0.1:45718"
/// ```
///
/// Every key is optional; missing keys fall back to CLI flags and then
/// to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub daemon: DaemonSection,
}

/// `[daemon]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSection {
    #[serde(default)]
    pub debounce_secs: Option<u64>,

    #[serde(default)]
    pub max_retries: Option<u32>,

    #[serde(default)]
    pub retry_reset_secs: Option<u64>,

    #[serde(default)]
    pub build_cmd: Option<String>,

    #[serde(default)]
    pub build_timeout_secs: Option<u64>,

    #[serde(default)]
    pub unix_socket: Option<String>,

    #[serde(default)]
    pub tcp_addr: Option<String>,
}

/// Fully resolved, validated configuration. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub scheduler: SchedulerSettings,
    pub build_cmd: String,
    /// Watchdog for hung builds; `None` lets a build run forever.
    pub build_timeout: Option<Duration>,
    pub unix_socket: PathBuf,
    pub tcp_addr: String,
}
