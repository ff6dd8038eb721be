//! Symlink tree projection.
//!
//! # Responsibility
//! - Give every concept node a directory under the destination root.
//! - Link each node directory to its children (named by the removed tag),
//!   back to its refinements (named by the added tag) and to its pages.
//! - Remove links and directories left over from earlier runs.
//!
//! # Invariants
//! - All links are relative, so the tree survives being moved together with
//!   the source directory.
//! - A correct link is never recreated; an unchanged corpus yields zero writes.
//! - A node whose edges violate the lattice invariant keeps its previous
//!   directory contents untouched.

use crate::config::Config;
use crate::lattice::builder::Lattice;
use crate::lattice::node::ConceptNode;
use crate::materialize::reconcile::{Reconciler, SweepPolicy};
use crate::materialize::{relative_path, MaterializeError, SyncAction, SyncReport, TreeLayout};
use crate::model::page::Page;
use log::info;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

/// Mirrors the lattice as a directory tree of relative symlinks.
#[derive(Debug, Clone)]
pub struct SymlinkMaterializer {
    layout: TreeLayout,
    extension: String,
    verbose: bool,
}

impl SymlinkMaterializer {
    pub fn new(layout: TreeLayout, extension: impl Into<String>, verbose: bool) -> Self {
        Self {
            layout,
            extension: extension.into(),
            verbose,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TreeLayout::symlink(config),
            &config.page_extension,
            config.verbose,
        )
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    /// Directory that represents `node`.
    pub fn node_dir(&self, node: &ConceptNode) -> PathBuf {
        self.layout.entry_path(node.key(), None)
    }

    /// Brings the symlink tree in line with `lattice`.
    pub fn materialize(&self, lattice: &Lattice<'_>) -> Result<SyncReport, MaterializeError> {
        let started_at = Instant::now();
        info!(
            "event=symlink_sync module=symlink status=start root={} nodes={}",
            self.layout.root.display(),
            lattice.len()
        );

        let mut sync = Reconciler::snapshot(&self.layout.root, "symlink", self.verbose)?;
        for node in lattice.nodes() {
            self.sync_node(&mut sync, lattice, node);
        }
        let report = sync.sweep(&SweepPolicy::LinksOnly);

        info!(
            "event=symlink_sync module=symlink status={} created={} replaced={} unchanged={} removed={} failures={} duration_ms={}",
            if report.is_clean() { "ok" } else { "warn" },
            report.created_links + report.created_dirs,
            report.replaced_links,
            report.unchanged,
            report.removed_links + report.removed_dirs,
            report.failures.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn sync_node(&self, sync: &mut Reconciler, lattice: &Lattice<'_>, node: &ConceptNode) {
        let dir = self.node_dir(node);
        let edges = lattice
            .labeled_children(node)
            .and_then(|children| Ok((children, lattice.labeled_parents(node)?)));
        let (children, refinements) = match edges {
            Ok(edges) => edges,
            Err(err) => {
                sync.record_failure(&dir, SyncAction::InvariantViolation, err.to_string());
                sync.retain_subtree(&dir);
                return;
            }
        };
        if !sync.ensure_dir(&dir) {
            return;
        }

        for (label, other) in children.into_iter().chain(refinements) {
            let target = relative_path(&dir, &self.node_dir(other));
            sync.ensure_symlink(&dir.join(label), &target, true);
        }
        for (name, page) in page_link_names(&lattice.pages_of(node), &self.extension) {
            sync.ensure_symlink(&dir.join(name), &relative_path(&dir, &page.path), false);
        }
    }
}

/// Link names for pages sharing one directory, in the order given.
///
/// A name is the page's link stem plus `.<extension>`. When names collide,
/// the page with the smallest id keeps the plain name and every other one
/// gets ` (<id>)` appended to its stem.
pub fn page_link_names<'p>(pages: &[&'p Page], extension: &str) -> Vec<(String, &'p Page)> {
    let mut by_id: Vec<usize> = (0..pages.len()).collect();
    by_id.sort_by(|&left, &right| pages[left].id.cmp(&pages[right].id));

    let mut names = vec![String::new(); pages.len()];
    let mut taken = HashSet::new();
    for index in by_id {
        let page = pages[index];
        let stem = page.link_stem();
        let mut name = format!("{stem}.{extension}");
        if taken.contains(&name) {
            name = format!("{stem} ({}).{extension}", page.id);
        }
        taken.insert(name.clone());
        names[index] = name;
    }

    names.into_iter().zip(pages.iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::page_link_names;
    use crate::model::page::Page;
    #[cfg(unix)]
    use {
        super::SymlinkMaterializer,
        crate::corpus::loader::{CorpusOptions, PageCorpus},
        crate::lattice::builder::Lattice,
        crate::materialize::{SyncAction, TreeLayout},
        std::fs,
    };

    #[test]
    fn colliding_titles_get_id_suffix_after_the_first() {
        let first = Page::from_title_line("/n/a1.md", "# *Tea* Notes");
        let second = Page::from_title_line("/n/b2.md", "# *Tea* Notes");
        let slashed = Page::from_title_line("/n/c3.md", "# *Tea* in/out");
        let names = page_link_names(&[&second, &first, &slashed], "md");
        let names: Vec<&str> = names.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["Tea Notes (b2).md", "Tea Notes.md", "Tea in_out.md"]);
    }

    #[cfg(unix)]
    #[test]
    fn inconsistent_edge_keeps_previous_directory_and_siblings_go_on() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("p1.md"), "# *A* *B* x").unwrap();
        fs::write(root.join("p2.md"), "# *C* y").unwrap();
        let corpus = PageCorpus::load(root, &CorpusOptions::default()).unwrap();
        let symlinks = SymlinkMaterializer::new(
            TreeLayout::new(root.join("symlink"), "concepts", ".combinations"),
            "md",
            false,
        );

        let mut lattice = Lattice::build(&corpus);
        assert!(symlinks.materialize(&lattice).unwrap().is_clean());
        let pair = lattice.node_for_tags(&["A", "B"]).unwrap();
        let pair_key = pair.key().clone();
        let pair_dir = symlinks.node_dir(pair);
        let sibling_dir = symlinks.node_dir(lattice.node_for_tags(&["C"]).unwrap());
        fs::remove_dir_all(&sibling_dir).unwrap();

        let c_key = lattice.node_for_tags(&["C"]).unwrap().key().clone();
        lattice.nodes.get_mut(&pair_key).unwrap().children.insert(c_key);
        let report = symlinks.materialize(&lattice).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].action, SyncAction::InvariantViolation);
        assert_eq!(report.failures[0].path, pair_dir);
        assert_eq!(report.removed_links, 0);
        for name in ["A", "B", "A B x.md"] {
            assert!(pair_dir.join(name).symlink_metadata().is_ok(), "{name} is gone");
        }
        assert!(sibling_dir.is_dir());
        assert_eq!(
            fs::read_to_string(sibling_dir.join("C y.md")).unwrap(),
            "# *C* y"
        );
    }
}
