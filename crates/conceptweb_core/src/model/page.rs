//! Page domain model.
//!
//! # Responsibility
//! - Represent one source note: id, display title, tag set and location.
//!
//! # Invariants
//! - `id` is the file stem and is unique inside one source directory.
//! - `tags` holds no two tags that are equal after case folding.
//! - Pages are never mutated after corpus load.

use crate::model::concept_key::{canonical_tag_set, ConceptKey};
use crate::model::title::parse_title_line;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One tagged note loaded from the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// File stem, expected to be a globally unique token.
    pub id: String,
    /// Heading text with markup removed.
    pub title: String,
    /// Distinct tags in source order.
    pub tags: Vec<String>,
    /// Tag-shaped tokens that were refused.
    pub rejected_tags: Vec<String>,
    /// Absolute location of the source file.
    pub path: PathBuf,
}

impl Page {
    /// Builds a page from its path and first line.
    pub fn from_title_line(path: impl Into<PathBuf>, first_line: &str) -> Self {
        let path = path.into();
        let parsed = parse_title_line(first_line);
        Self {
            id: page_id_for(&path),
            title: parsed.title,
            tags: canonical_tag_set(&parsed.tags),
            rejected_tags: parsed.rejected,
            path,
        }
    }

    /// Key of the node this page attaches to, `None` for untagged pages.
    pub fn concept_key(&self) -> Option<ConceptKey> {
        ConceptKey::from_tags(&self.tags)
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }

    /// File name used for links to this page inside a concept directory.
    ///
    /// Path separators and NUL in the title become `_`; an empty title falls
    /// back to the page id.
    pub fn link_stem(&self) -> String {
        let cleaned: String = self
            .title
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
            .collect();
        let cleaned = cleaned.trim();
        if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
            self.id.clone()
        } else {
            cleaned.to_string()
        }
    }
}

/// Returns the file stem used as page id.
pub fn page_id_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
