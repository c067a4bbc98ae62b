//! Mismatch report writer
//!
//! One CSV sink shared by every worker. Each append writes the row and
//! flushes under a single lock acquisition, so rows from different workers
//! never interleave and a killed run leaves only whole rows behind.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use modsrecon_common::mapping::FieldMapping;
use thiserror::Error;

use crate::comparator::ReportRow;

/// Report writer errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report file could not be created
    #[error("Cannot create report {0}: {1}")]
    Create(PathBuf, String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row width does not match the header
    #[error("Row for node {node_id} has {actual} cells, expected {expected}")]
    WidthMismatch {
        node_id: String,
        expected: usize,
        actual: usize,
    },

    /// Another writer panicked while holding the lock
    #[error("Report writer lock poisoned")]
    Poisoned,
}

/// Shared, append-only CSV report
pub struct ReportWriter<W: Write> {
    inner: Mutex<csv::Writer<W>>,
    columns: usize,
}

impl ReportWriter<File> {
    /// Create (truncating) the report file and write its header
    pub fn create(path: &Path, mapping: &FieldMapping) -> Result<Self, ReportError> {
        let file = File::create(path)
            .map_err(|e| ReportError::Create(path.to_path_buf(), e.to_string()))?;
        tracing::info!(path = %path.display(), columns = mapping.len(), "Report created");
        Self::new(file, mapping)
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap a sink and write the header row
    pub fn new(sink: W, mapping: &FieldMapping) -> Result<Self, ReportError> {
        let mut writer = csv::WriterBuilder::new().flexible(false).from_writer(sink);
        writer.write_record(mapping.header())?;
        writer.flush()?;

        Ok(Self {
            inner: Mutex::new(writer),
            columns: mapping.len(),
        })
    }

    /// Append one row: write and flush as one critical section
    pub fn append(&self, row: &ReportRow) -> Result<(), ReportError> {
        if row.cells.len() != self.columns {
            return Err(ReportError::WidthMismatch {
                node_id: row.node_id.clone(),
                expected: self.columns,
                actual: row.cells.len(),
            });
        }

        let record = row.to_record();
        let mut writer = self.inner.lock().map_err(|_| ReportError::Poisoned)?;
        writer.write_record(&record)?;
        writer.flush()?;
        Ok(())
    }

    /// Recover the underlying sink
    pub fn into_inner(self) -> Result<W, ReportError> {
        let writer = self.inner.into_inner().map_err(|_| ReportError::Poisoned)?;
        writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsrecon_common::Field;
    use std::sync::Arc;

    fn mapping() -> FieldMapping {
        FieldMapping::new(vec![("title", Field::Title), ("field_genre", Field::Genre)]).unwrap()
    }

    fn row(node_id: &str, title: &[&str], genre: &[&str]) -> ReportRow {
        ReportRow {
            node_id: node_id.to_string(),
            cells: vec![
                title.iter().map(|s| s.to_string()).collect(),
                genre.iter().map(|s| s.to_string()).collect(),
            ],
        }
    }

    #[test]
    fn test_header_written_on_creation() {
        let writer = ReportWriter::new(Vec::new(), &mapping()).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, "node_id,title,field_genre\n");
    }

    #[test]
    fn test_multi_valued_cells_pipe_joined() {
        let writer = ReportWriter::new(Vec::new(), &mapping()).unwrap();
        writer
            .append(&row("42", &["A \"quoted\" title"], &["maps", "atlases"]))
            .unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "node_id,title,field_genre\n42,\"A \"\"quoted\"\" title\",maps|atlases\n"
        );
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let writer = ReportWriter::new(Vec::new(), &mapping()).unwrap();
        let bad = ReportRow {
            node_id: "1".to_string(),
            cells: vec![vec![]],
        };
        assert!(matches!(
            writer.append(&bad),
            Err(ReportError::WidthMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_concurrent_appends_keep_rows_whole() {
        let writer = Arc::new(ReportWriter::new(Vec::new(), &mapping()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = Arc::clone(&writer);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("{}-{}", t, i);
                        writer.append(&row(&id, &["title, with comma"], &["g"])).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let writer = Arc::try_unwrap(writer).ok().unwrap();
        let out = writer.into_inner().unwrap();
        let mut reader = csv::Reader::from_reader(out.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 400);
        assert!(rows.iter().all(|r| r.len() == 3 && &r[1] == "title, with comma"));
    }

    #[test]
    fn test_create_reports_path_on_failure() {
        let err = ReportWriter::create(Path::new("/nonexistent/dir/update.csv"), &mapping())
            .err()
            .unwrap();
        assert!(matches!(err, ReportError::Create(_, _)));
    }
}
