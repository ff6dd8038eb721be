//! Lattice construction from a page corpus.
//!
//! # Responsibility
//! - Attach every tagged page to the node of its full tag set.
//! - Expand each full set downward through every one-tag-smaller subset,
//!   creating nodes on first reference and linking parent -> child.
//!
//! # Invariants
//! - A node is expanded at most once; revisiting it is a no-op.
//! - Graph shape depends only on the set of pages, never on their order.
//! - Subsets not reachable from some page's full set are never created.

use crate::corpus::loader::PageCorpus;
use crate::lattice::combinations::Combinations;
use crate::lattice::node::{edge_label, ConceptNode, LatticeInvariantViolation};
use crate::model::concept_key::ConceptKey;
use crate::model::page::Page;
use log::info;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Summary counts of one lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LatticeStats {
    pub nodes: usize,
    pub edges: usize,
    pub leaf_nodes: usize,
    pub attached_pages: usize,
    pub untagged_pages: usize,
}

/// Identity-keyed node table plus the pages it refers to.
#[derive(Debug, Clone)]
pub struct Lattice<'c> {
    pages: &'c [Page],
    pub(crate) nodes: BTreeMap<ConceptKey, ConceptNode>,
    untagged_pages: usize,
}

impl<'c> Lattice<'c> {
    /// Builds the lattice for every page in the corpus.
    pub fn build(corpus: &'c PageCorpus) -> Self {
        LatticeBuilder::new(corpus.pages()).build()
    }

    /// Nodes ordered by tag count, then by folded key.
    pub fn nodes(&self) -> impl Iterator<Item = &ConceptNode> {
        self.nodes.values()
    }

    /// Single-tag nodes, the entry points of both projections.
    pub fn leaves(&self) -> impl Iterator<Item = &ConceptNode> {
        self.nodes.values().filter(|node| node.is_leaf_concept())
    }

    pub fn node(&self, key: &ConceptKey) -> Option<&ConceptNode> {
        self.nodes.get(key)
    }

    /// Looks a node up by any spelling and order of its tags.
    pub fn node_for_tags<S: AsRef<str>>(&self, tags: &[S]) -> Option<&ConceptNode> {
        ConceptKey::from_tags(tags).and_then(|key| self.nodes.get(&key))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.children.len()).sum()
    }

    /// Pages attached directly to `node`, ordered by title then id.
    pub fn pages_of(&self, node: &ConceptNode) -> Vec<&'c Page> {
        let mut pages: Vec<&'c Page> = node.pages.iter().map(|&index| &self.pages[index]).collect();
        pages.sort_by(|left, right| left.title.cmp(&right.title).then(left.id.cmp(&right.id)));
        pages
    }

    /// Children of `node` with their edge labels, ordered by label.
    pub fn labeled_children<'a>(
        &'a self,
        node: &'a ConceptNode,
    ) -> Result<Vec<(&'a str, &'a ConceptNode)>, LatticeInvariantViolation> {
        let mut labeled = Vec::new();
        for child in node.children().filter_map(|key| self.nodes.get(key)) {
            labeled.push((edge_label(node, child)?, child));
        }
        sort_by_label(&mut labeled);
        Ok(labeled)
    }

    /// Parents of `node` with the tag each one adds, ordered by label.
    pub fn labeled_parents<'a>(
        &'a self,
        node: &'a ConceptNode,
    ) -> Result<Vec<(&'a str, &'a ConceptNode)>, LatticeInvariantViolation> {
        let mut labeled = Vec::new();
        for parent in node.parents().filter_map(|key| self.nodes.get(key)) {
            labeled.push((edge_label(parent, node)?, parent));
        }
        sort_by_label(&mut labeled);
        Ok(labeled)
    }

    pub fn stats(&self) -> LatticeStats {
        LatticeStats {
            nodes: self.nodes.len(),
            edges: self.edge_count(),
            leaf_nodes: self.leaves().count(),
            attached_pages: self.nodes.values().map(|node| node.pages.len()).sum(),
            untagged_pages: self.untagged_pages,
        }
    }
}

fn sort_by_label(labeled: &mut [(&str, &ConceptNode)]) {
    labeled.sort_by(|left, right| {
        left.0
            .to_lowercase()
            .cmp(&right.0.to_lowercase())
            .then_with(|| left.1.key().cmp(right.1.key()))
    });
}

/// Memoizing builder behind `Lattice::build`.
pub struct LatticeBuilder<'c> {
    pages: &'c [Page],
    nodes: BTreeMap<ConceptKey, ConceptNode>,
    expanded: HashSet<ConceptKey>,
}

impl<'c> LatticeBuilder<'c> {
    pub fn new(pages: &'c [Page]) -> Self {
        Self {
            pages,
            nodes: BTreeMap::new(),
            expanded: HashSet::new(),
        }
    }

    pub fn build(mut self) -> Lattice<'c> {
        let started_at = Instant::now();
        let mut untagged_pages = 0;

        for (index, page) in self.pages.iter().enumerate() {
            let Some(key) = self.obtain(&page.tags) else {
                untagged_pages += 1;
                continue;
            };
            if let Some(node) = self.nodes.get_mut(&key) {
                if !node.pages.contains(&index) {
                    node.pages.push(index);
                }
            }
            self.expand(key);
        }

        let lattice = Lattice {
            pages: self.pages,
            nodes: self.nodes,
            untagged_pages,
        };
        info!(
            "event=lattice_build module=lattice status=ok nodes={} edges={} untagged={} duration_ms={}",
            lattice.len(),
            lattice.edge_count(),
            untagged_pages,
            started_at.elapsed().as_millis()
        );
        lattice
    }

    /// Returns the key for `tags`, creating the node on first reference.
    fn obtain(&mut self, tags: &[String]) -> Option<ConceptKey> {
        let key = ConceptKey::from_tags(tags)?;
        self.nodes
            .entry(key.clone())
            .or_insert_with(|| ConceptNode::new(key.clone(), tags.to_vec()));
        Some(key)
    }

    /// Links `key` to every subset one tag smaller, then recurses into them.
    fn expand(&mut self, key: ConceptKey) {
        if key.arity() <= 1 || !self.expanded.insert(key.clone()) {
            return;
        }
        let tags = match self.nodes.get(&key) {
            Some(node) => node.tags.clone(),
            None => return,
        };

        for subset in Combinations::new(&tags, tags.len() - 1) {
            let Some(child_key) = self.obtain(&subset) else {
                continue;
            };
            self.link(&key, &child_key);
            self.expand(child_key);
        }
    }

    fn link(&mut self, parent: &ConceptKey, child: &ConceptKey) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.insert(child.clone());
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parents.insert(parent.clone());
        }
    }
}
