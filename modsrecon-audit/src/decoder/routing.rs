//! Per-element routing table
//!
//! One function per top-level MODS element family. Plain elements map 1:1
//! to a field; typed and compound elements are encoded; wrapper elements
//! (`originInfo`, `physicalDescription`, ...) fan out to several fields.

use modsrecon_common::compound::{PartDetail, RelatedItem, TypedText};
use modsrecon_common::Field;
use roxmltree::Node;

use super::{attr, child, children, path_text, subject, text, DecodeWarning, DecodedRecord, DEFAULT_ROLE};

pub(super) fn route(element: Node<'_, '_>, out: &mut DecodedRecord) {
    match element.tag_name().name() {
        "titleInfo" => title_info(element, out),
        "name" => contributor(element, out),
        "subject" => subject::route(element, out),
        "abstract" => typed_text(element, Field::Abstract, out),
        "identifier" => typed_text(element, Field::Identifier, out),
        "note" => typed_text(element, Field::Note, out),
        "accessCondition" => out.push(Field::AccessCondition, text(element)),
        "classification" => out.push(Field::Classification, text(element)),
        "genre" => out.push(Field::Genre, text(element)),
        "typeOfResource" => out.push(Field::ResourceType, text(element)),
        "tableOfContents" => out.push(Field::TableOfContents, text(element)),
        "language" => language(element, out),
        "location" => {
            for location in children(element, "physicalLocation") {
                push_non_empty(out, Field::PhysicalLocation, text(location));
            }
        }
        "originInfo" => origin_info(element, out),
        "physicalDescription" => physical_description(element, out),
        "recordInfo" => {
            for origin in children(element, "recordOrigin") {
                push_non_empty(out, Field::RecordOrigin, text(origin));
            }
        }
        "relatedItem" => related_item(element, out),
        "part" => part(element, out),
        other => tracing::trace!(element = other, "No route for element"),
    }
}

fn push_non_empty(out: &mut DecodedRecord, field: Field, value: String) {
    if !value.is_empty() {
        out.push(field, value);
    }
}

fn title_info(element: Node<'_, '_>, out: &mut DecodedRecord) {
    let field = if attr(element, "type") == "alternative" {
        Field::AltTitle
    } else {
        Field::Title
    };
    for title in children(element, "title") {
        push_non_empty(out, field, text(title));
    }
    for part_name in children(element, "partName") {
        push_non_empty(out, Field::TitlePartName, text(part_name));
    }
}

/// `relators:{role}:person:{name}`
fn contributor(element: Node<'_, '_>, out: &mut DecodedRecord) {
    let parts: Vec<String> = children(element, "namePart")
        .map(text)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        out.warn(DecodeWarning::EmptyContributor);
        return;
    }

    let role = children(element, "role")
        .flat_map(|role| children(role, "roleTerm"))
        .filter(|term| attr(*term, "type") == "code")
        .map(text)
        .find(|code| !code.is_empty())
        .unwrap_or_else(|| DEFAULT_ROLE.to_string());

    out.push(
        Field::Names,
        format!("relators:{}:person:{}", role, parts.join(", ")),
    );
}

/// Text qualified by `type` and `point`; empty elements stay empty
fn typed_text(element: Node<'_, '_>, field: Field, out: &mut DecodedRecord) {
    let value = text(element);
    if value.is_empty() {
        out.push(field, value);
        return;
    }
    let typed = TypedText::new(value)
        .with_attr0(attr(element, "type"))
        .with_attr1(attr(element, "point"));
    out.push_encoded(field, &typed);
}

fn language(element: Node<'_, '_>, out: &mut DecodedRecord) {
    if let Some(term) = children(element, "languageTerm")
        .map(text)
        .find(|t| !t.is_empty())
    {
        out.push(Field::Language, term);
    }
}

fn origin_info(element: Node<'_, '_>, out: &mut DecodedRecord) {
    for item in element.children().filter(Node::is_element) {
        let name = item.tag_name().name();
        if name == "place" {
            for term in children(item, "placeTerm") {
                push_non_empty(out, Field::Place, text(term));
            }
            continue;
        }

        let value = text(item);
        if value.is_empty() {
            continue;
        }
        match name {
            "dateCaptured" => out.push(Field::DateCaptured, value),
            "dateCreated" => out.push(Field::DateCreated, value),
            "dateIssued" => out.push(Field::DateIssued, value),
            "dateValid" => out.push(Field::DateValid, value),
            "dateOther" => {
                let date = TypedText::new(value)
                    .with_attr0(attr(item, "type"))
                    .with_attr1(attr(item, "point"));
                out.push_encoded(Field::DateOther, &date);
            }
            "edition" => out.push(Field::Edition, value),
            "issuance" => out.push(Field::Issuance, value),
            "publisher" => out.push(
                Field::Names,
                format!("relators:pbl:corporate_body:{}", value),
            ),
            other => tracing::trace!(element = other, "No route for originInfo child"),
        }
    }
}

fn physical_description(element: Node<'_, '_>, out: &mut DecodedRecord) {
    for item in element.children().filter(Node::is_element) {
        let value = text(item);
        if value.is_empty() {
            continue;
        }
        match item.tag_name().name() {
            "extent" => {
                let extent = TypedText::new(value).with_attr0(attr(item, "unit"));
                out.push_encoded(Field::Extent, &extent);
            }
            "form" => out.push(Field::Form, value),
            "internetMediaType" => out.push(Field::InternetMediaType, value),
            "digitalOrigin" => out.push(Field::DigitalOrigin, value),
            "note" => {
                let note = TypedText::new(value).with_attr0(attr(item, "type"));
                out.push_encoded(Field::PhysicalDescription, &note);
            }
            other => tracing::trace!(element = other, "No route for physicalDescription child"),
        }
    }
}

fn related_item(element: Node<'_, '_>, out: &mut DecodedRecord) {
    let item = RelatedItem {
        identifier: child(element, "identifier").map(text).unwrap_or_default(),
        title: path_text(element, &["titleInfo", "title"]),
        number: path_text(element, &["part", "detail", "number"]),
    };
    out.push_encoded(Field::RelatedItem, &item);
}

fn part(element: Node<'_, '_>, out: &mut DecodedRecord) {
    let detail = match child(element, "detail") {
        Some(detail) => PartDetail {
            detail_type: attr(detail, "type").to_string(),
            caption: path_text(detail, &["caption"]),
            number: path_text(detail, &["number"]),
            title: path_text(detail, &["title"]),
        },
        None => PartDetail::default(),
    };
    out.push_encoded(Field::PartDetail, &detail);
}
