//! Error handling module for goldt.
//!
//! This module provides the error type shared by the store, the toolchain
//! and the lifecycle driver. Per-test errors are converted into outcomes by
//! the driver; only configuration and discovery errors reach the
//! top level.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for goldt.
#[derive(Error, Debug)]
pub enum GoldtError {
    /// Error when the configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An expected-state artifact could not be read or written.
    #[error("Failed to access {}: {cause}", path.display())]
    Store {
        path: PathBuf,
        cause: std::io::Error,
    },

    /// A `.code.expected` artifact holds something other than an integer.
    #[error("Invalid return code {text:?} in {}", path.display())]
    InvalidReturnCode { path: PathBuf, text: String },

    /// The test directory could not be scanned.
    #[error("Failed to read test directory {}: {cause}", path.display())]
    Discovery {
        path: PathBuf,
        cause: std::io::Error,
    },

    /// An external program could not be started or waited on.
    #[error("Failed to run {program}: {cause}")]
    Launch {
        program: String,
        cause: std::io::Error,
    },

    /// An external program did not finish within the configured timeout.
    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when the JSON report cannot be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using GoldtError.
pub type Result<T> = std::result::Result<T, GoldtError>;
