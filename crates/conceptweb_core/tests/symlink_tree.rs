#![cfg(unix)]

use conceptweb_core::{
    ConceptKey, CorpusOptions, Lattice, PageCorpus, SymlinkMaterializer, SyncAction, TreeLayout,
};
use std::fs;
use std::path::{Path, PathBuf};

fn symlinks_for(root: &Path) -> SymlinkMaterializer {
    SymlinkMaterializer::new(
        TreeLayout::new(root.join("symlink"), "concepts", ".combinations"),
        "md",
        false,
    )
}

fn load(root: &Path) -> PageCorpus {
    PageCorpus::load(root, &CorpusOptions::default()).unwrap()
}

#[test]
fn page_links_are_relative_and_resolve_to_sources() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *Favorite* Food").unwrap();
    fs::write(root.join("p2.md"), "# *Favorite* Drink").unwrap();

    let corpus = load(root);
    let report = symlinks_for(root).materialize(&Lattice::build(&corpus)).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.created_links, 2);

    let link = root.join("symlink/concepts/Favorite/Favorite Food.md");
    assert_eq!(fs::read_link(&link).unwrap(), PathBuf::from("../../../p1.md"));
    assert_eq!(fs::read_to_string(&link).unwrap(), "# *Favorite* Food");
    assert!(root
        .join("symlink/concepts/Favorite/Favorite Drink.md")
        .exists());
}

#[test]
fn concepts_navigate_down_by_removed_tag_and_up_by_added_tag() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *A* *B* *C* Item").unwrap();

    let corpus = load(root);
    symlinks_for(root).materialize(&Lattice::build(&corpus)).unwrap();

    let ab = ConceptKey::from_tags(&["A", "B"]).unwrap();
    assert_eq!(
        fs::read_link(root.join("symlink/concepts/A/B")).unwrap(),
        PathBuf::from(format!("../../.combinations/{}", ab.identity()))
    );
    assert_eq!(
        fs::read_link(root.join(format!("symlink/.combinations/{}/A", ab.identity()))).unwrap(),
        PathBuf::from("../../concepts/B")
    );
    assert!(root.join("symlink/concepts/A/B/C/A B C Item.md").exists());
    assert!(root.join("symlink/concepts/C/A/B/A B C Item.md").exists());
}

#[test]
fn rerun_over_unchanged_corpus_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *A* *B* *C* Item").unwrap();
    fs::write(root.join("p2.md"), "# *B* *D* Other").unwrap();

    let corpus = load(root);
    let lattice = Lattice::build(&corpus);
    let symlinks = symlinks_for(root);
    let first = symlinks.materialize(&lattice).unwrap();
    assert!(first.writes() > 0);

    let second = symlinks.materialize(&lattice).unwrap();
    assert_eq!(second.writes(), 0);
    assert_eq!(second.unchanged, first.created_links);
}

#[test]
fn removed_page_drops_exactly_its_link() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *Food* Apple").unwrap();
    fs::write(root.join("p2.md"), "# *Food* Pear").unwrap();

    let symlinks = symlinks_for(root);
    {
        let corpus = load(root);
        symlinks.materialize(&Lattice::build(&corpus)).unwrap();
    }
    fs::remove_file(root.join("p2.md")).unwrap();

    let corpus = load(root);
    let report = symlinks.materialize(&Lattice::build(&corpus)).unwrap();

    assert_eq!(report.removed_links, 1);
    assert_eq!(report.removed_dirs, 0);
    assert_eq!(report.created_links, 0);
    assert_eq!(report.unchanged, 1);
    assert!(root
        .join("symlink/concepts/Food/Food Apple.md")
        .symlink_metadata()
        .is_ok());
    assert!(root
        .join("symlink/concepts/Food/Food Pear.md")
        .symlink_metadata()
        .is_err());
}

#[test]
fn vanished_concept_directory_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *Tea* green").unwrap();
    fs::write(root.join("p2.md"), "# *Coffee* black").unwrap();

    let symlinks = symlinks_for(root);
    {
        let corpus = load(root);
        symlinks.materialize(&Lattice::build(&corpus)).unwrap();
    }
    fs::write(root.join("p2.md"), "# untagged now").unwrap();

    let corpus = load(root);
    let report = symlinks.materialize(&Lattice::build(&corpus)).unwrap();

    assert_eq!(report.removed_links, 1);
    assert_eq!(report.removed_dirs, 1);
    assert!(!root.join("symlink/concepts/Coffee").exists());
    assert!(root.join("symlink/concepts/Tea").is_dir());
}

#[test]
fn foreign_file_in_link_path_is_reported_and_kept() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *Tea* green").unwrap();
    fs::create_dir_all(root.join("symlink/concepts/Tea")).unwrap();
    fs::write(root.join("symlink/concepts/Tea/Tea green.md"), "mine").unwrap();

    let corpus = load(root);
    let report = symlinks_for(root).materialize(&Lattice::build(&corpus)).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].action, SyncAction::Occupied);
    assert_eq!(
        fs::read_to_string(root.join("symlink/concepts/Tea/Tea green.md")).unwrap(),
        "mine"
    );
}

#[test]
fn untagged_corpus_creates_no_concepts() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# Plain").unwrap();

    let corpus = load(root);
    let report = symlinks_for(root).materialize(&Lattice::build(&corpus)).unwrap();

    assert_eq!(report.created_links, 0);
    assert_eq!(fs::read_dir(root.join("symlink")).unwrap().count(), 0);
}

#[test]
fn foreign_symlink_in_place_of_primary_dir_keeps_writes_inside_root() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::write(root.join("p1.md"), "# *Food* Apple").unwrap();
    fs::write(root.join("p2.md"), "# *Tea* green").unwrap();
    fs::create_dir(root.join("symlink")).unwrap();
    std::os::unix::fs::symlink(outside.path(), root.join("symlink/concepts")).unwrap();

    let corpus = load(root);
    let report = symlinks_for(root).materialize(&Lattice::build(&corpus)).unwrap();

    assert_eq!(fs::read_dir(outside.path()).unwrap().count(), 0);
    assert_eq!(report.created_links, 0);
    assert_eq!(report.failures[0].action, SyncAction::Occupied);
    assert!(report
        .failures
        .iter()
        .any(|failure| failure.path == root.join("symlink/concepts/Tea")));
    assert!(root
        .join("symlink/concepts")
        .symlink_metadata()
        .unwrap()
        .file_type()
        .is_symlink());
}
