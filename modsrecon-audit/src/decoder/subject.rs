//! Subject disambiguation
//!
//! A `subject` element routes to exactly one of four destination families
//! depending on which inner shape is populated. Shapes are checked in
//! [`SUBJECT_PRIORITY`] order and the first populated one wins, so a subject
//! carrying both a topic and a geographic term is a topical subject.

use modsrecon_common::compound::{tag_numeric, HierarchicalGeographic};
use modsrecon_common::Field;
use roxmltree::Node;

use super::{attr, child, path_text, text, DecodeWarning, DecodedRecord};

/// Inner shapes a subject may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectShape {
    /// `subject/topic`
    Topic,
    /// `subject/geographic`
    Geographic,
    /// `subject/name/namePart`
    Name,
    /// `subject/hierarchicalGeographic/*`
    HierarchicalGeographic,
}

/// Order in which subject shapes are tried
pub const SUBJECT_PRIORITY: [SubjectShape; 4] = [
    SubjectShape::Topic,
    SubjectShape::Geographic,
    SubjectShape::Name,
    SubjectShape::HierarchicalGeographic,
];

impl SubjectShape {
    fn is_populated(self, subject: Node<'_, '_>) -> bool {
        match self {
            SubjectShape::Topic => !path_text(subject, &["topic"]).is_empty(),
            SubjectShape::Geographic => !path_text(subject, &["geographic"]).is_empty(),
            SubjectShape::Name => !path_text(subject, &["name", "namePart"]).is_empty(),
            SubjectShape::HierarchicalGeographic => !hierarchical_geographic(subject).is_empty(),
        }
    }
}

/// First populated shape in priority order
pub fn detect(subject: Node<'_, '_>) -> Option<SubjectShape> {
    SUBJECT_PRIORITY
        .into_iter()
        .find(|shape| shape.is_populated(subject))
}

pub(super) fn route(subject: Node<'_, '_>, out: &mut DecodedRecord) {
    let Some(shape) = detect(subject) else {
        out.warn(DecodeWarning::UnrecognizedSubject);
        return;
    };

    match shape {
        SubjectShape::Topic => {
            let value = tag_numeric(&path_text(subject, &["topic"]));
            match attr(subject, "authority") {
                "" => out.push(Field::Subject, value),
                "lcsh" => out.push(Field::SubjectLcsh, value),
                authority => {
                    tracing::info!(authority, topic = %value, "Dropping topic under unmapped authority");
                    out.warn(DecodeWarning::UnroutedSubject {
                        authority: authority.to_string(),
                    });
                }
            }
        }
        SubjectShape::Geographic => {
            let Some(geographic) = child(subject, "geographic") else {
                return;
            };
            let vocabulary = match attr(geographic, "authority") {
                "naf" => "geographic_naf",
                "local" => "geographic_local",
                _ => "geo_location",
            };
            let place = tag_numeric(&text(geographic));
            out.push(Field::SubjectGeographic, format!("{}:{}", vocabulary, place));
        }
        SubjectShape::Name => {
            let name = tag_numeric(&path_text(subject, &["name", "namePart"]));
            out.push(Field::SubjectName, name);
        }
        SubjectShape::HierarchicalGeographic => {
            out.push_encoded(
                Field::SubjectGeographicHierarchical,
                &hierarchical_geographic(subject),
            );
        }
    }
}

fn hierarchical_geographic(subject: Node<'_, '_>) -> HierarchicalGeographic {
    let Some(place) = child(subject, "hierarchicalGeographic") else {
        return HierarchicalGeographic::default();
    };
    HierarchicalGeographic {
        city: path_text(place, &["city"]),
        continent: path_text(place, &["continent"]),
        country: path_text(place, &["country"]),
        county: path_text(place, &["county"]),
        state: path_text(place, &["state"]),
        territory: path_text(place, &["territory"]),
    }
}
