//! Element path survey
//!
//! Walks a directory of MODS files and records every element path
//! (`mods/titleInfo/title`) and attribute path (`mods/name/@type`) seen,
//! with a sample value and an occurrence count. Used to find shapes the
//! decoder's routing table does not cover yet.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};

use crate::decoder::DecodeError;
use crate::services::{FileScanner, ScanError};

/// Sample printed for paths that never carried text
pub const NO_SAMPLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathStats {
    /// First non-empty text (or attribute value) seen at this path
    pub sample: Option<String>,
    pub occurrences: usize,
}

/// Paths in first-seen order with their stats
#[derive(Debug, Clone, Default)]
pub struct PathSurvey {
    order: Vec<String>,
    stats: HashMap<String, PathStats>,
    files: usize,
    failed: usize,
}

impl PathSurvey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every path in one document
    pub fn add_document(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(text.trim_start_matches('\u{feff}'), options)
            .map_err(|e| DecodeError::MalformedDocument(e.to_string()))?;

        self.visit(doc.root_element(), "");
        self.files += 1;
        Ok(())
    }

    fn visit(&mut self, node: Node<'_, '_>, parent: &str) {
        let tag = node.tag_name().name();
        let path = if parent.is_empty() {
            tag.to_string()
        } else {
            format!("{}/{}", parent, tag)
        };

        let own_text: String = node
            .children()
            .filter(Node::is_text)
            .filter_map(|n| n.text())
            .collect();
        self.record(&path, own_text.trim());

        for attribute in node.attributes() {
            let attr_path = format!("{}/@{}", path, attribute.name());
            self.record(&attr_path, attribute.value().trim());
        }

        for child in node.children().filter(Node::is_element) {
            self.visit(child, &path);
        }
    }

    fn record(&mut self, path: &str, sample: &str) {
        if !self.stats.contains_key(path) {
            self.order.push(path.to_string());
        }
        let stats = self.stats.entry(path.to_string()).or_default();
        stats.occurrences += 1;
        if stats.sample.is_none() && !sample.is_empty() {
            stats.sample = Some(sample.to_string());
        }
    }

    /// (path, stats) in first-seen order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PathStats)> {
        self.order
            .iter()
            .filter_map(move |p| self.stats.get(p).map(|s| (p.as_str(), s)))
    }

    pub fn get(&self, path: &str) -> Option<&PathStats> {
        self.stats.get(path)
    }

    /// Documents successfully surveyed
    pub fn files(&self) -> usize {
        self.files
    }

    /// Documents skipped because they failed to read or parse
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Write `path\tsample\toccurrences` lines
    pub fn write_tsv<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for (path, stats) in self.entries() {
            let sample = stats
                .sample
                .as_deref()
                .map(|s| s.replace(|c: char| matches!(c, '\t' | '\n' | '\r'), " "))
                .unwrap_or_else(|| NO_SAMPLE.to_string());
            writeln!(out, "{}\t{}\t{}", path, sample, stats.occurrences)?;
        }
        Ok(())
    }
}

/// Survey every object file under `root`
pub fn survey_dir(root: &Path, scanner: &FileScanner) -> Result<PathSurvey, ScanError> {
    let mut survey = PathSurvey::new();
    scanner.walk(root, |file| {
        let result = std::fs::read(&file.path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| survey.add_document(&bytes).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!(path = %file.path.display(), error = %e, "Skipping file in survey");
            survey.failed += 1;
        }
        true
    })?;

    tracing::info!(
        files = survey.files,
        failed = survey.failed,
        paths = survey.order.len(),
        "Survey complete"
    );
    Ok(survey)
}
