//! Unified error handling for fancurved.
//!
//! One error type covers every failure the daemon can hit: sysfs I/O,
//! reporter process management, temperature parsing, and configuration.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

/// Result type alias using ControlError
pub type Result<T> = std::result::Result<T, ControlError>;

/// Unified error type for all control-loop operations
#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to spawn telemetry reporter `{command}`: {source}")]
    Spawn { command: String, source: io::Error },

    #[error("failed to read from telemetry reporter `{command}`: {source}")]
    StreamRead { command: String, source: io::Error },

    #[error("unparseable temperature {text:?} from {origin}: {source}")]
    Parse {
        origin: String,
        text: String,
        source: ParseIntError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ControlError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
