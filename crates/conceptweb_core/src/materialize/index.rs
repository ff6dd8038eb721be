//! Index document projection.
//!
//! # Responsibility
//! - Render one markdown document per concept node plus a root entry-point
//!   document listing every single-tag concept.
//! - Write documents through the reconciler so unchanged bytes are left alone
//!   and documents of vanished concepts are swept.
//!
//! # Invariants
//! - Every link in a document is relative to the document's own directory.
//! - A node whose edges violate the lattice invariant gets no new document;
//!   its previous document, if any, is kept and the failure is reported.

use crate::config::Config;
use crate::lattice::builder::Lattice;
use crate::lattice::node::{ConceptNode, LatticeInvariantViolation};
use crate::materialize::reconcile::{Reconciler, SweepPolicy};
use crate::materialize::{relative_link, MaterializeError, SyncAction, SyncReport, TreeLayout};
use log::info;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// File name of the entry-point document.
pub const ROOT_DOCUMENT: &str = "README.md";

const ROOT_HEADING: &str = "Concepts";

/// Writes the lattice as cross-linked markdown documents.
#[derive(Debug, Clone)]
pub struct IndexMaterializer {
    layout: TreeLayout,
    extension: String,
    verbose: bool,
}

impl IndexMaterializer {
    pub fn new(layout: TreeLayout, extension: impl Into<String>, verbose: bool) -> Self {
        Self {
            layout,
            extension: extension.into(),
            verbose,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TreeLayout::index(config),
            &config.page_extension,
            config.verbose,
        )
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn root_document_path(&self) -> PathBuf {
        self.layout.root.join(ROOT_DOCUMENT)
    }

    /// Path of the document rendered for `node`.
    pub fn document_path(&self, node: &ConceptNode) -> PathBuf {
        self.layout.entry_path(node.key(), Some(&self.extension))
    }

    /// Renders the entry-point document.
    pub fn render_root(&self, lattice: &Lattice<'_>) -> String {
        let mut leaves: Vec<&ConceptNode> = lattice.leaves().collect();
        leaves.sort_by(|left, right| {
            left.heading()
                .to_lowercase()
                .cmp(&right.heading().to_lowercase())
                .then_with(|| left.key().cmp(right.key()))
        });

        let mut doc = format!("# {ROOT_HEADING}\n\n");
        for leaf in leaves {
            let target = self.link_to(&self.layout.root, &self.document_path(leaf));
            push_entry(&mut doc, &leaf.heading(), &target);
        }
        doc
    }

    /// Renders the document for one node.
    pub fn render_node(
        &self,
        lattice: &Lattice<'_>,
        node: &ConceptNode,
    ) -> Result<String, LatticeInvariantViolation> {
        let children = lattice.labeled_children(node)?;
        let refinements = lattice.labeled_parents(node)?;
        let path = self.document_path(node);
        let doc_dir = path.parent().unwrap_or(&self.layout.root);

        let pages = lattice.pages_of(node);

        let mut doc = format!("# {}\n", node.heading());
        if !children.is_empty() {
            doc.push_str("\n## Children\n\n");
            for (label, child) in &children {
                push_entry(&mut doc, label, &self.link_to(doc_dir, &self.document_path(child)));
            }
        }
        if !refinements.is_empty() {
            doc.push_str("\n## Refinements\n\n");
            for (label, parent) in &refinements {
                push_entry(&mut doc, label, &self.link_to(doc_dir, &self.document_path(parent)));
            }
        }
        if !pages.is_empty() {
            doc.push_str("\n## Pages\n\n");
            for page in pages {
                let text = if page.title.is_empty() {
                    page.id.as_str()
                } else {
                    page.title.as_str()
                };
                push_entry(&mut doc, text, &self.link_to(doc_dir, &page.path));
            }
        }
        Ok(doc)
    }

    /// Brings the index tree in line with `lattice`.
    pub fn materialize(&self, lattice: &Lattice<'_>) -> Result<SyncReport, MaterializeError> {
        let started_at = Instant::now();
        info!(
            "event=index_write module=index status=start root={} nodes={}",
            self.layout.root.display(),
            lattice.len()
        );

        let mut sync = Reconciler::snapshot(&self.layout.root, "index", self.verbose)?;
        sync.ensure_file(&self.root_document_path(), self.render_root(lattice).as_bytes());

        for node in lattice.nodes() {
            let path = self.document_path(node);
            match self.render_node(lattice, node) {
                Ok(doc) => {
                    sync.ensure_file(&path, doc.as_bytes());
                }
                Err(err) => {
                    sync.record_failure(&path, SyncAction::InvariantViolation, err.to_string());
                    sync.retain_subtree(&path);
                }
            }
        }

        let report = sync.sweep(&SweepPolicy::LinksAndFiles {
            extension: self.extension.clone(),
        });
        info!(
            "event=index_write module=index status={} written={} unchanged={} removed={} failures={} duration_ms={}",
            if report.is_clean() { "ok" } else { "warn" },
            report.written_files,
            report.unchanged,
            report.removed_files + report.removed_dirs,
            report.failures.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn link_to(&self, from_dir: &Path, to: &Path) -> String {
        let link = relative_link(from_dir, to);
        if from_dir == self.layout.root.as_path() && !link.starts_with("..") {
            format!("./{link}")
        } else {
            link
        }
    }
}

fn push_entry(doc: &mut String, text: &str, target: &str) {
    let _ = writeln!(doc, "* [{}]({})", escape_text(text), escape_target(target));
}

fn escape_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Wraps targets markdown would otherwise cut short.
fn escape_target(target: &str) -> String {
    if target.contains(|c: char| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{target}>")
    } else {
        target.to_string()
    }
}
