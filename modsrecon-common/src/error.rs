//! Common error types for modsrecon

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for modsrecon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across modsrecon crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Identifier registry could not be loaded
    #[error("Identifier registry {path}: {reason}")]
    Registry { path: PathBuf, reason: String },

    /// Unknown report column or field name
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
