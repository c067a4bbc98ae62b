//! I/O services used by the audit pipeline
//!
//! - Directory scanning for legacy MODS files
//! - Live document fetch
//! - Node id resolution with a run-scoped cache

pub mod file_scanner;
pub mod identifier_cache;
pub mod mods_client;

pub use file_scanner::{FileScanner, ObjectFile, ScanError};
pub use identifier_cache::{
    HttpIdentifierResolver, IdentifierCache, IdentifierResolver, Resolution, ResolveError,
};
pub use mods_client::{build_http_client, FetchError, LiveDocument, LiveSource, ModsClient};
