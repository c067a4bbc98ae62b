//! Report column mapping
//!
//! The single source of truth for which fields are audited and how each is
//! labeled in the report. Built once at startup and shared read-only.

use crate::model::Field;
use crate::{Error, Result};

/// Leading report column holding the resolved node identifier
pub const NODE_ID_COLUMN: &str = "node_id";

/// Ordered mapping of report column name to canonical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    columns: Vec<(String, Field)>,
}

impl FieldMapping {
    /// Map every field under its default column
    pub fn all() -> Self {
        Self {
            columns: Field::ALL
                .iter()
                .map(|f| (f.default_column().to_string(), *f))
                .collect(),
        }
    }

    /// Build a mapping from explicit (column, field) pairs
    ///
    /// Column names must be unique and must not shadow [`NODE_ID_COLUMN`].
    pub fn new<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        let mut columns: Vec<(String, Field)> = Vec::new();
        for (column, field) in pairs {
            let column = column.into();
            if column == NODE_ID_COLUMN {
                return Err(Error::InvalidInput(format!(
                    "column name '{}' is reserved",
                    NODE_ID_COLUMN
                )));
            }
            if columns.iter().any(|(c, _)| *c == column) {
                return Err(Error::InvalidInput(format!("duplicate column '{}'", column)));
            }
            columns.push((column, field));
        }
        if columns.is_empty() {
            return Err(Error::InvalidInput("field mapping is empty".to_string()));
        }
        Ok(Self { columns })
    }

    /// Subset of the default mapping selected by field or column names
    pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let pairs = names
            .iter()
            .map(|name| {
                let field = name.as_ref().parse::<Field>()?;
                Ok((field.default_column(), field))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(pairs)
    }

    /// (column, field) pairs in report order
    pub fn columns(&self) -> impl Iterator<Item = (&str, Field)> {
        self.columns.iter().map(|(c, f)| (c.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Report header: node id column followed by every mapped column
    pub fn header(&self) -> Vec<String> {
        std::iter::once(NODE_ID_COLUMN.to_string())
            .chain(self.columns.iter().map(|(c, _)| c.clone()))
            .collect()
    }
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self::all()
    }
}
