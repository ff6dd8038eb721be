//! Cross-page link check.
//!
//! # Responsibility
//! - Find relative markdown links in page bodies that point at a page file.
//! - Report links whose target page is not part of the corpus.
//!
//! # Invariants
//! - Pages are read, never rewritten.
//! - URLs with a scheme and in-page anchors are ignored.

use crate::config::absolute_normalized;
use crate::corpus::loader::PageCorpus;
use crate::model::page::page_id_for;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)\)").expect("valid link regex"));
static URL_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("valid scheme regex"));

/// Link to a page file that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingLink {
    /// Page containing the link.
    pub page: PathBuf,
    /// Link target as written.
    pub target: String,
}

/// Result of one link scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    /// Number of page bodies scanned.
    pub scanned: usize,
    /// Number of links that pointed at page files.
    pub page_links: usize,
    pub dangling: Vec<DanglingLink>,
    /// Pages whose body could not be read.
    pub unreadable: Vec<PathBuf>,
}

/// Scans every page body in the corpus.
pub fn check_page_links(corpus: &PageCorpus, extension: &str) -> LinkReport {
    let known_ids: BTreeSet<&str> = corpus.pages().iter().map(|page| page.id.as_str()).collect();
    let source_dir = corpus.source_dir();
    let mut report = LinkReport::default();

    for page in corpus.pages() {
        let body = match std::fs::read_to_string(&page.path) {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    "event=link_check module=corpus status=warn path={} error={}",
                    page.path.display(),
                    err
                );
                report.unreadable.push(page.path.clone());
                continue;
            }
        };
        report.scanned += 1;

        let page_dir = page.path.parent().unwrap_or(source_dir);
        for target in page_link_targets(&body, extension) {
            report.page_links += 1;
            if !target_exists(page_dir, source_dir, &target, &known_ids) {
                report.dangling.push(DanglingLink {
                    page: page.path.clone(),
                    target,
                });
            }
        }
    }

    info!(
        "event=link_check module=corpus status=ok scanned={} page_links={} dangling={}",
        report.scanned,
        report.page_links,
        report.dangling.len()
    );
    report
}

/// Extracts relative link targets ending in `.<extension>`.
pub fn page_link_targets(body: &str, extension: &str) -> Vec<String> {
    let suffix = format!(".{extension}");
    MARKDOWN_LINK_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .map(|target| target.split('#').next().unwrap_or(target))
        .filter(|target| !URL_SCHEME_RE.is_match(target) && target.ends_with(&suffix))
        .map(str::to_string)
        .collect()
}

fn target_exists(
    page_dir: &Path,
    source_dir: &Path,
    target: &str,
    known_ids: &BTreeSet<&str>,
) -> bool {
    let Ok(resolved) = absolute_normalized(&page_dir.join(target)) else {
        return false;
    };
    if resolved.parent() == Some(source_dir) {
        return known_ids.contains(page_id_for(&resolved).as_str());
    }
    resolved.exists()
}
