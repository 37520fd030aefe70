//! Error types for the CLI

use polydb_core::Fault;
use thiserror::Error;

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Error raised by a polydb crate
    #[error(transparent)]
    Fault(#[from] Fault),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),

    /// Schema or connection file that does not parse
    #[error("Invalid {kind} file {path}: {message}")]
    InvalidFile {
        kind: &'static str,
        path: String,
        message: String,
    },

    /// The binary was built without the driver a dialect needs
    #[error("No driver for {0} in this build; rebuild with the matching feature")]
    NoDriver(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
