//! Canonical identity for a set of tags.
//!
//! # Responsibility
//! - Map a tag set to one stable key, independent of order and case.
//! - Provide the identity string used to name index documents and directories.
//!
//! # Invariants
//! - Equality, ordering and hashing use the folded form only: tags lowercased,
//!   deduplicated, sorted and joined with `\n`.
//! - A single-tag identity is the tag exactly as given.
//! - A multi-tag identity is the lowercase hex SHA-256 of the folded form, so
//!   it is stable across runs and processes.

use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

const FOLD_SEPARATOR: &str = "\n";

/// Canonical key of one concept node.
#[derive(Debug, Clone)]
pub struct ConceptKey {
    folded: String,
    identity: String,
    arity: usize,
}

impl ConceptKey {
    /// Builds the key for a tag set. Returns `None` for an empty set.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Option<Self> {
        let folded_set: BTreeSet<String> = tags.iter().map(|tag| fold_tag(tag.as_ref())).collect();
        let arity = folded_set.len();
        let folded = folded_set
            .into_iter()
            .collect::<Vec<_>>()
            .join(FOLD_SEPARATOR);

        let identity = match arity {
            0 => return None,
            1 => tags[0].as_ref().to_string(),
            _ => format!("{:x}", Sha256::digest(folded.as_bytes())),
        };

        Some(Self {
            folded,
            identity,
            arity,
        })
    }

    /// Name used on disk for this concept.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Case-folded, sorted tag list joined with newlines.
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Number of distinct tags (after folding).
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn is_single(&self) -> bool {
        self.arity == 1
    }
}

impl PartialEq for ConceptKey {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for ConceptKey {}

impl Hash for ConceptKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl PartialOrd for ConceptKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConceptKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.arity
            .cmp(&other.arity)
            .then_with(|| self.folded.cmp(&other.folded))
    }
}

impl Display for ConceptKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identity)
    }
}

/// Case-folds one tag.
pub fn fold_tag(tag: &str) -> String {
    tag.to_lowercase()
}

/// Deduplicates tags case-insensitively, keeping the first spelling and the
/// source order.
pub fn canonical_tag_set(tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.iter()
        .filter(|tag| seen.insert(fold_tag(tag)))
        .cloned()
        .collect()
}
