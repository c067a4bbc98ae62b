//! Reconciliation comparator
//!
//! Walks the field mapping and compares legacy against current values for
//! one object. The report always carries the legacy side: the audit records
//! what the old system held, it does not pick a winner.
//!
//! # Per-column algorithm
//! 1. Sort both value lists on their comparison key so element order drift
//!    is not a mismatch
//! 2. Walk legacy values by position
//! 3. No current value at that position → mismatch
//! 4. Both empty → recorded as empty, not a mismatch
//! 5. Otherwise `fuzzy_eq(normalize(a), normalize(b))` decides
//!
//! Extra values on the current side are not flagged.

use modsrecon_common::mapping::FieldMapping;
use modsrecon_common::normalize::comparison_key;
use modsrecon_common::{fuzzy_eq, normalize, Field, MetadataRecord};

/// Separator for multi-valued report cells
pub const CELL_SEPARATOR: &str = "|";

/// One disagreeing value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub column: String,
    pub field: Field,
    /// Position in the key-sorted legacy list
    pub position: usize,
    pub legacy: String,
    /// Current value at the same position, if any
    pub current: Option<String>,
}

/// Report row for one object
///
/// `cells` is parallel to the mapping's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub node_id: String,
    pub cells: Vec<Vec<String>>,
}

impl ReportRow {
    /// CSV record: node id followed by pipe-joined cells
    pub fn to_record(&self) -> Vec<String> {
        std::iter::once(self.node_id.clone())
            .chain(self.cells.iter().map(|values| values.join(CELL_SEPARATOR)))
            .collect()
    }
}

/// Outcome of comparing one object
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub row: ReportRow,
    pub mismatches: Vec<FieldMismatch>,
}

impl Reconciliation {
    pub fn is_mismatched(&self) -> bool {
        !self.mismatches.is_empty()
    }

    /// Row to report, present only when at least one column disagreed
    pub fn into_report_row(self) -> Option<ReportRow> {
        if self.is_mismatched() {
            Some(self.row)
        } else {
            None
        }
    }
}

/// Compare the legacy and current records of one object
pub fn compare(
    node_id: &str,
    legacy: &MetadataRecord,
    current: &MetadataRecord,
    mapping: &FieldMapping,
) -> Reconciliation {
    let mut cells = Vec::with_capacity(mapping.len());
    let mut mismatches = Vec::new();

    for (column, field) in mapping.columns() {
        let legacy_values = sorted(legacy.values(field));
        let current_values = sorted(current.values(field));
        let mut cell = Vec::with_capacity(legacy_values.len());

        for (position, legacy_value) in legacy_values.iter().enumerate() {
            let current_value = current_values.get(position);
            let agrees = match current_value {
                None => false,
                Some(cv) if legacy_value.is_empty() && cv.is_empty() => true,
                Some(cv) => fuzzy_eq(&normalize(legacy_value), &normalize(cv)),
            };

            if !agrees {
                let mismatch = FieldMismatch {
                    column: column.to_string(),
                    field,
                    position,
                    legacy: legacy_value.to_string(),
                    current: current_value.map(|v| v.to_string()),
                };
                log_mismatch(node_id, &mismatch);
                mismatches.push(mismatch);
            }
            cell.push(legacy_value.to_string());
        }

        cells.push(cell);
    }

    Reconciliation {
        row: ReportRow {
            node_id: node_id.to_string(),
            cells,
        },
        mismatches,
    }
}

/// Values ordered by comparison key, raw text breaking ties
///
/// Sorting on the raw text would pair `maps` with `Atlases` when the other
/// side reads `Maps, atlases`.
fn sorted(values: &[String]) -> Vec<&str> {
    let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
    values.sort_by_cached_key(|v| (comparison_key(v), v.to_string()));
    values
}

fn log_mismatch(node_id: &str, mismatch: &FieldMismatch) {
    let legacy = normalize(&mismatch.legacy);
    let current = mismatch.current.as_deref().map(normalize);
    let similarity = current
        .as_deref()
        .map(|c| strsim::normalized_levenshtein(&legacy, c))
        .unwrap_or(0.0);

    tracing::info!(
        node_id,
        column = %mismatch.column,
        position = mismatch.position,
        legacy = %legacy,
        current = current.as_deref().unwrap_or("<missing>"),
        similarity = format!("{:.2}", similarity),
        "Mismatch"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(Field, &str)]) -> MetadataRecord {
        let mut record = MetadataRecord::new();
        for (field, value) in pairs {
            record.push(*field, *value);
        }
        record
    }

    fn mapping(fields: &[Field]) -> FieldMapping {
        FieldMapping::new(fields.iter().map(|f| (f.default_column(), *f))).unwrap()
    }

    #[test]
    fn test_equal_records_produce_no_row() {
        let legacy = record(&[(Field::Title, "The Cat"), (Field::Genre, "photographs")]);
        let current = record(&[(Field::Title, "the  cat"), (Field::Genre, "Photographs.")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Title, Field::Genre]));
        assert!(!result.is_mismatched());
        assert!(result.into_report_row().is_none());
    }

    #[test]
    fn test_both_empty_is_not_a_mismatch() {
        let legacy = record(&[(Field::Abstract, "")]);
        let current = record(&[(Field::Abstract, "")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Abstract]));
        assert!(!result.is_mismatched());
        assert_eq!(result.row.cells, vec![vec![String::new()]]);
    }

    #[test]
    fn test_absent_on_both_sides() {
        let result = compare(
            "12",
            &MetadataRecord::new(),
            &MetadataRecord::new(),
            &mapping(&[Field::Note]),
        );
        assert!(!result.is_mismatched());
        assert_eq!(result.row.to_record(), vec!["12".to_string(), String::new()]);
    }

    #[test]
    fn test_legacy_longer_flags_and_records_all_legacy_values() {
        let legacy = record(&[(Field::Subject, "Bridges"), (Field::Subject, "Canals")]);
        let current = record(&[(Field::Subject, "Bridges")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Subject]));

        assert!(result.is_mismatched());
        assert_eq!(result.mismatches.len(), 1);
        let mismatch = &result.mismatches[0];
        assert_eq!(mismatch.position, 1);
        assert_eq!(mismatch.legacy, "Canals");
        assert_eq!(mismatch.current, None);

        let row = result.into_report_row().unwrap();
        assert_eq!(row.to_record(), vec!["12", "Bridges|Canals"]);
    }

    #[test]
    fn test_current_longer_is_not_flagged() {
        let legacy = record(&[(Field::Genre, "atlases")]);
        let current = record(&[(Field::Genre, "maps"), (Field::Genre, "atlases")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Genre]));
        assert!(!result.is_mismatched());
    }

    #[test]
    fn test_extra_current_value_can_shift_sorted_positions() {
        // Sorted: legacy ["maps"] vs current ["atlases", "maps"]
        let legacy = record(&[(Field::Genre, "maps")]);
        let current = record(&[(Field::Genre, "maps"), (Field::Genre, "atlases")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Genre]));
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].legacy, "maps");
        assert_eq!(result.mismatches[0].current.as_deref(), Some("atlases"));
    }

    #[test]
    fn test_order_drift_ignored() {
        let legacy = record(&[(Field::Genre, "maps"), (Field::Genre, "atlases")]);
        let current = record(&[(Field::Genre, "Atlases"), (Field::Genre, "maps")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Genre]));
        assert!(!result.is_mismatched());
    }

    #[test]
    fn test_case_only_order_drift_ignored() {
        let legacy = record(&[(Field::Genre, "maps"), (Field::Genre, "Atlases")]);
        let current = record(&[(Field::Genre, "Maps"), (Field::Genre, "atlases")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Genre]));
        assert!(result.mismatches.is_empty(), "{:?}", result.mismatches);
        assert_eq!(result.row.cells, vec![vec!["Atlases".to_string(), "maps".to_string()]]);
    }

    #[test]
    fn test_punctuation_only_order_drift_ignored() {
        let legacy = record(&[(Field::Subject, "Bridges."), (Field::Subject, "\"Canals\"")]);
        let current = record(&[(Field::Subject, "canals"), (Field::Subject, "bridges")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::Subject]));
        assert!(!result.is_mismatched());
    }

    #[test]
    fn test_alphanumeric_difference_flagged() {
        let legacy = record(&[(Field::DateIssued, "1923")]);
        let current = record(&[(Field::DateIssued, "1924")]);
        let result = compare("12", &legacy, &current, &mapping(&[Field::DateIssued]));
        assert_eq!(
            result.mismatches,
            vec![FieldMismatch {
                column: "field_edtf_date_issued".to_string(),
                field: Field::DateIssued,
                position: 0,
                legacy: "1923".to_string(),
                current: Some("1924".to_string()),
            }]
        );
    }

    #[test]
    fn test_row_cells_follow_mapping_order() {
        let legacy = record(&[(Field::Genre, "maps"), (Field::Title, "A")]);
        let current = record(&[(Field::Title, "B")]);
        let result = compare("9", &legacy, &current, &mapping(&[Field::Title, Field::Genre]));
        assert_eq!(result.row.to_record(), vec!["9", "A", "maps"]);
        assert_eq!(result.mismatches.len(), 2);
    }
}
