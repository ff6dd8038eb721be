//! Concept node and lattice invariant errors.

use crate::model::concept_key::{fold_tag, ConceptKey};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One canonical point in the lattice.
#[derive(Debug, Clone)]
pub struct ConceptNode {
    pub(crate) key: ConceptKey,
    pub(crate) tags: Vec<String>,
    pub(crate) children: BTreeSet<ConceptKey>,
    pub(crate) parents: BTreeSet<ConceptKey>,
    pub(crate) pages: Vec<usize>,
}

impl ConceptNode {
    pub(crate) fn new(key: ConceptKey, tags: Vec<String>) -> Self {
        Self {
            key,
            tags,
            children: BTreeSet::new(),
            parents: BTreeSet::new(),
            pages: Vec::new(),
        }
    }

    pub fn key(&self) -> &ConceptKey {
        &self.key
    }

    pub fn identity(&self) -> &str {
        self.key.identity()
    }

    /// Tags in the spelling first seen for this combination.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Heading text: tags joined by single spaces.
    pub fn heading(&self) -> String {
        self.tags.join(" ")
    }

    /// Nodes whose tag set is this set minus one tag.
    pub fn children(&self) -> impl Iterator<Item = &ConceptKey> {
        self.children.iter()
    }

    /// Nodes whose tag set is this set plus one tag.
    pub fn parents(&self) -> impl Iterator<Item = &ConceptKey> {
        self.parents.iter()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_leaf_concept(&self) -> bool {
        self.key.is_single()
    }

    /// Tags of `self` that `other` lacks, in `self`'s spelling.
    pub fn tags_missing_from<'a>(&'a self, other: &ConceptNode) -> Vec<&'a str> {
        let other_folded: BTreeSet<String> = other.tags.iter().map(|tag| fold_tag(tag)).collect();
        self.tags
            .iter()
            .filter(|tag| !other_folded.contains(&fold_tag(tag)))
            .map(String::as_str)
            .collect()
    }
}

/// Parent/child tag difference was not exactly one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatticeInvariantViolation {
    pub parent: String,
    pub child: String,
    pub difference: Vec<String>,
}

impl Display for LatticeInvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "edge `{}` -> `{}` differs by {} tags [{}], expected exactly one",
            self.parent,
            self.child,
            self.difference.len(),
            self.difference.join(", ")
        )
    }
}

impl Error for LatticeInvariantViolation {}

/// Returns the single tag in `parent` but not in `child`.
pub fn edge_label<'a>(
    parent: &'a ConceptNode,
    child: &ConceptNode,
) -> Result<&'a str, LatticeInvariantViolation> {
    let difference = parent.tags_missing_from(child);
    let is_subset = child.tags.len() + 1 == parent.tags.len();
    if let ([label], true) = (difference.as_slice(), is_subset) {
        return Ok(*label);
    }
    Err(LatticeInvariantViolation {
        parent: parent.heading(),
        child: child.heading(),
        difference: difference.into_iter().map(str::to_string).collect(),
    })
}
