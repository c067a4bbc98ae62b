//! Compound value encodings
//!
//! Sub-structures (typed text, related items, part details, hierarchical
//! places) are serialized to compact JSON with empty members omitted, so a
//! compound compares as a single value. Attribute metadata is part of the
//! encoding: a dropped `type` attribute on one side changes the value.

use serde::Serialize;

/// Prefix applied to purely numeric subject values
pub const NUMERIC_SUBJECT_PREFIX: &str = "workbench-number-";

/// Text carrying up to two qualifying attributes (type, point, unit)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypedText {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attr0: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub attr1: String,
    pub value: String,
}

impl TypedText {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_attr0(mut self, attr: impl Into<String>) -> Self {
        self.attr0 = attr.into();
        self
    }

    pub fn with_attr1(mut self, attr: impl Into<String>) -> Self {
        self.attr1 = attr.into();
        self
    }
}

/// Related item reduced to its comparable parts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedItem {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub number: String,
}

/// Part detail (volume, issue, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartDetail {
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub detail_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub caption: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
}

/// Hierarchical geographic place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchicalGeographic {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub city: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub continent: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub county: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub territory: String,
}

impl HierarchicalGeographic {
    pub fn is_empty(&self) -> bool {
        self.city.is_empty()
            && self.continent.is_empty()
            && self.country.is_empty()
            && self.county.is_empty()
            && self.state.is_empty()
            && self.territory.is_empty()
    }
}

/// Serialize a compound to its compact encoded form
pub fn encode<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Tag integer-looking subject values so they cannot collide with numeric
/// data held elsewhere in the record
pub fn tag_numeric(value: &str) -> String {
    if value.parse::<i64>().is_ok() {
        format!("{NUMERIC_SUBJECT_PREFIX}{value}")
    } else {
        value.to_string()
    }
}
