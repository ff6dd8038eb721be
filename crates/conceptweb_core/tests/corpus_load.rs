use conceptweb_core::{CorpusError, CorpusIssue, CorpusOptions, PageCorpus};
use std::fs;

const UUID_NAME: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427.md";

#[test]
fn load_reads_first_lines_and_keeps_pages_in_id_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.md"), "# *Favorite* Drink\nbody\n").unwrap();
    fs::write(dir.path().join("a.md"), "# *Favorite* Food").unwrap();
    fs::write(dir.path().join("notes.txt"), "# *Ignored* text").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/c.md"), "# *Nested* page").unwrap();

    let corpus = PageCorpus::load(dir.path(), &CorpusOptions::default()).unwrap();

    let ids: Vec<&str> = corpus.pages().iter().map(|page| page.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(corpus.pages()[1].title, "Favorite Drink");
    assert_eq!(corpus.pages()[1].tags, vec!["Favorite".to_string()]);
    assert!(corpus.issues().is_empty());
}

#[test]
fn empty_file_is_skipped_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty.md"), "").unwrap();
    fs::write(dir.path().join("ok.md"), "# *Tea*").unwrap();

    let corpus = PageCorpus::load(dir.path(), &CorpusOptions::default()).unwrap();

    assert_eq!(corpus.len(), 1);
    assert_eq!(corpus.skipped_count(), 1);
    assert!(matches!(
        &corpus.issues()[0],
        CorpusIssue::UnreadableSource { path, .. } if path.ends_with("empty.md")
    ));
}

#[test]
fn duplicate_titles_are_reported_and_both_pages_kept() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("one.md"), "# *Tea* Notes").unwrap();
    fs::write(dir.path().join("two.md"), "# *Tea* Notes").unwrap();

    let corpus = PageCorpus::load(dir.path(), &CorpusOptions::default()).unwrap();

    assert_eq!(corpus.len(), 2);
    assert_eq!(corpus.duplicate_title_count(), 1);
    match &corpus.issues()[0] {
        CorpusIssue::DuplicateTitle { title, paths } => {
            assert_eq!(title, "Tea Notes");
            assert_eq!(paths.len(), 2);
        }
        other => panic!("unexpected issue: {other}"),
    }
}

#[test]
fn unsafe_tag_is_rejected_but_page_survives() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("p.md"), "# *in/out* *Tea*").unwrap();

    let corpus = PageCorpus::load(dir.path(), &CorpusOptions::default()).unwrap();

    assert_eq!(corpus.pages()[0].tags, vec!["Tea".to_string()]);
    assert!(matches!(
        &corpus.issues()[0],
        CorpusIssue::RejectedTag { tag, .. } if tag == "in/out"
    ));
}

#[test]
fn strict_naming_only_accepts_uuid_names() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(UUID_NAME), "# *Tea*").unwrap();
    fs::write(dir.path().join("draft.md"), "# *Coffee*").unwrap();

    let options = CorpusOptions {
        strict_naming: true,
        ..CorpusOptions::default()
    };
    let strict = PageCorpus::load(dir.path(), &options).unwrap();
    assert_eq!(strict.len(), 1);
    assert_eq!(strict.pages()[0].title, "Tea");

    let relaxed = PageCorpus::load(dir.path(), &CorpusOptions::default()).unwrap();
    assert_eq!(relaxed.len(), 2);
}

#[test]
fn missing_source_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = PageCorpus::load(&dir.path().join("absent"), &CorpusOptions::default()).unwrap_err();
    assert!(matches!(err, CorpusError::ListFailed { .. }));
}
