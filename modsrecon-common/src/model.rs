//! Canonical field model
//!
//! A [`MetadataRecord`] is the platform-independent view of one MODS document:
//! every semantic field the audit knows about, each holding zero or more values
//! in document order. Values are plain strings; compound sub-structures are
//! pre-encoded by [`crate::compound`] so they compare as one unit.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Semantic fields a metadata record may carry
///
/// Field identity is shared by both decodings being compared, so the same
/// variant always names the same concept regardless of source system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Title,
    AltTitle,
    TitlePartName,
    Names,
    Abstract,
    AccessCondition,
    Classification,
    Genre,
    Identifier,
    Language,
    PhysicalLocation,
    Note,
    DateCaptured,
    DateCreated,
    DateIssued,
    DateOther,
    DateValid,
    Edition,
    Issuance,
    Place,
    Extent,
    Form,
    InternetMediaType,
    DigitalOrigin,
    PhysicalDescription,
    RecordOrigin,
    RelatedItem,
    ResourceType,
    Subject,
    SubjectLcsh,
    SubjectGeographic,
    SubjectName,
    SubjectGeographicHierarchical,
    TableOfContents,
    PartDetail,
}

impl Field {
    /// Every field, in default report order
    pub const ALL: [Field; 35] = [
        Field::Title,
        Field::AltTitle,
        Field::TitlePartName,
        Field::Names,
        Field::Abstract,
        Field::AccessCondition,
        Field::Classification,
        Field::Genre,
        Field::Identifier,
        Field::Language,
        Field::PhysicalLocation,
        Field::Note,
        Field::DateCaptured,
        Field::DateCreated,
        Field::DateIssued,
        Field::DateOther,
        Field::DateValid,
        Field::Edition,
        Field::Issuance,
        Field::Place,
        Field::Extent,
        Field::Form,
        Field::InternetMediaType,
        Field::DigitalOrigin,
        Field::PhysicalDescription,
        Field::RecordOrigin,
        Field::RelatedItem,
        Field::ResourceType,
        Field::Subject,
        Field::SubjectLcsh,
        Field::SubjectGeographic,
        Field::SubjectName,
        Field::SubjectGeographicHierarchical,
        Field::TableOfContents,
        Field::PartDetail,
    ];

    /// Stable snake_case identifier
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::AltTitle => "alt_title",
            Field::TitlePartName => "title_part_name",
            Field::Names => "names",
            Field::Abstract => "abstract",
            Field::AccessCondition => "access_condition",
            Field::Classification => "classification",
            Field::Genre => "genre",
            Field::Identifier => "identifier",
            Field::Language => "language",
            Field::PhysicalLocation => "physical_location",
            Field::Note => "note",
            Field::DateCaptured => "date_captured",
            Field::DateCreated => "date_created",
            Field::DateIssued => "date_issued",
            Field::DateOther => "date_other",
            Field::DateValid => "date_valid",
            Field::Edition => "edition",
            Field::Issuance => "issuance",
            Field::Place => "place",
            Field::Extent => "extent",
            Field::Form => "form",
            Field::InternetMediaType => "internet_media_type",
            Field::DigitalOrigin => "digital_origin",
            Field::PhysicalDescription => "physical_description",
            Field::RecordOrigin => "record_origin",
            Field::RelatedItem => "related_item",
            Field::ResourceType => "resource_type",
            Field::Subject => "subject",
            Field::SubjectLcsh => "subject_lcsh",
            Field::SubjectGeographic => "subject_geographic",
            Field::SubjectName => "subject_name",
            Field::SubjectGeographicHierarchical => "subject_geographic_hierarchical",
            Field::TableOfContents => "table_of_contents",
            Field::PartDetail => "part_detail",
        }
    }

    /// Report column the field is audited under by default
    pub fn default_column(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::AltTitle => "field_alt_title",
            Field::TitlePartName => "field_title_part_name",
            Field::Names => "field_linked_agent",
            Field::Abstract => "field_abstract",
            Field::AccessCondition => "field_rights",
            Field::Classification => "field_classification",
            Field::Genre => "field_genre",
            Field::Identifier => "field_identifier",
            Field::Language => "field_language",
            Field::PhysicalLocation => "field_physical_location",
            Field::Note => "field_note",
            Field::DateCaptured => "field_date_captured",
            Field::DateCreated => "field_edtf_date_created",
            Field::DateIssued => "field_edtf_date_issued",
            Field::DateOther => "field_edtf_date",
            Field::DateValid => "field_date_valid",
            Field::Edition => "field_edition",
            Field::Issuance => "field_mode_of_issuance",
            Field::Place => "field_place_published",
            Field::Extent => "field_extent",
            Field::Form => "field_physical_form",
            Field::InternetMediaType => "field_media_type",
            Field::DigitalOrigin => "field_digital_origin",
            Field::PhysicalDescription => "field_physical_description",
            Field::RecordOrigin => "field_record_origin",
            Field::RelatedItem => "field_related_item",
            Field::ResourceType => "field_resource_type",
            Field::Subject => "field_subject",
            Field::SubjectLcsh => "field_lcsh_topic",
            Field::SubjectGeographic => "field_geographic_subject",
            Field::SubjectName => "field_subjects_name",
            Field::SubjectGeographicHierarchical => "field_subject_hierarchical_geo",
            Field::TableOfContents => "field_table_of_contents",
            Field::PartDetail => "field_part_detail",
        }
    }

    /// Look up a field by its identifier or its default column name
    pub fn lookup(name: &str) -> Option<Field> {
        let name = name.trim();
        Field::ALL
            .into_iter()
            .find(|f| f.name() == name || f.default_column() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::lookup(s).ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// Decoded field values for one document
///
/// Built once by the decoder, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    fields: BTreeMap<Field, Vec<String>>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value to a field, preserving document order
    pub fn push(&mut self, field: Field, value: impl Into<String>) {
        self.fields.entry(field).or_default().push(value.into());
    }

    /// Values for a field (empty slice when the field is absent)
    pub fn values(&self, field: Field) -> &[String] {
        self.fields.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when no field holds any value
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }

    /// Number of values across all fields
    pub fn value_count(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    /// Populated fields with their values
    pub fn iter(&self) -> impl Iterator<Item = (Field, &[String])> {
        self.fields.iter().map(|(f, v)| (*f, v.as_slice()))
    }
}
