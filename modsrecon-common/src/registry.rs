//! Identifier registry
//!
//! Two-column table exported from the new platform mapping each node id to
//! the legacy object identifier (`nid,pid`, with a header row). Loaded once
//! at startup and shared read-only.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

/// Legacy identifier (pid) to node identifier (nid) lookup
#[derive(Debug, Clone, Default)]
pub struct IdentifierRegistry {
    nids: HashMap<String, String>,
}

impl IdentifierRegistry {
    /// Load a registry file
    ///
    /// Missing or unreadable files are an error: the audit cannot label its
    /// report rows without it.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::Registry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let registry = Self::from_reader(file).map_err(|e| Error::Registry {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            path = %path.display(),
            entries = registry.len(),
            "Loaded identifier registry"
        );
        Ok(registry)
    }

    /// Parse registry rows from any reader
    ///
    /// Rows that do not have exactly two columns are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut nids = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.len() != 2 {
                tracing::debug!(columns = record.len(), "Skipping registry row");
                continue;
            }
            let nid = record[0].trim();
            let pid = record[1].trim();
            if nid.is_empty() || pid.is_empty() {
                continue;
            }
            nids.insert(pid.to_string(), nid.to_string());
        }

        Ok(Self { nids })
    }

    /// Node identifier for a legacy pid
    pub fn nid(&self, pid: &str) -> Option<&str> {
        self.nids.get(pid).map(String::as_str)
    }

    pub fn insert(&mut self, pid: impl Into<String>, nid: impl Into<String>) {
        self.nids.insert(pid.into(), nid.into());
    }

    pub fn len(&self) -> usize {
        self.nids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nids.is_empty()
    }
}
