// src/config/mod.rs

//! Configuration loading and validation for rebuildd.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and layer CLI flags on top (`loader.rs`).
//! - Validate and clamp the merged values (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_resolve, load_from_path};
pub use model::{DaemonConfig, DaemonSection, RawConfigFile};
pub use validate::{resolve_config, validate_config};
