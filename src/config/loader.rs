// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::CliArgs;
use crate::config::model::{DaemonConfig, RawConfigFile};
use crate::config::validate::resolve_config;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; merging with CLI flags and
/// validation happen in [`load_and_resolve`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: RawConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Build the effective [`DaemonConfig`] for this process.
///
/// Layering: built-in defaults, then the `--config` file (if any), then
/// explicit CLI flags.
pub fn load_and_resolve(args: &CliArgs) -> Result<DaemonConfig> {
    let file = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    let config = resolve_config(&file, args)?;
    Ok(config)
}
