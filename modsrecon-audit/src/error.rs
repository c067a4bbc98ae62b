//! Error types for modsrecon-audit
//!
//! Per-object conditions (local read, fetch, decode, unresolved node id) are
//! never errors at this level: the pipeline logs and counts them as skips.
//! [`PipelineError`] is reserved for conditions that abort the run.

use thiserror::Error;

use crate::report::ReportError;
use crate::services::file_scanner::ScanError;
use crate::services::mods_client::FetchError;

/// Run-aborting pipeline error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration or registry failure
    #[error("Common error: {0}")]
    Common(#[from] modsrecon_common::Error),

    /// Root directory cannot be enumerated
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Report file cannot be created or its header written
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// HTTP client could not be constructed
    #[error("Client error: {0}")]
    Client(#[from] FetchError),

    /// A worker or the producer task panicked
    #[error("Worker failed: {0}")]
    Worker(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        PipelineError::Worker(e.to_string())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
