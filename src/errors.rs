// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RebuildError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid endpoint '{0}' (expected unix:/path or tcp:host:port)")]
    InvalidEndpoint(String),

    #[error("Failed to bind {endpoint}: {source}")]
    BindFailed {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("refusing to run as root")]
    RunningAsRoot,
}

pub type Result<T> = std::result::Result<T, RebuildError>;
