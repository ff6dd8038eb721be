//! Source directory loader.
//!
//! # Responsibility
//! - Build `Page` records from every eligible file in one directory.
//! - Collect per-file problems as diagnostics instead of failing the load.
//!
//! # Invariants
//! - The scan is not recursive.
//! - Pages are ordered by id, so downstream output does not depend on
//!   directory enumeration order.
//! - Only a failure to list the directory itself is fatal.

use crate::config::Config;
use crate::model::page::{page_id_for, Page};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

const HYPHENATED_UUID_LEN: usize = 36;

/// Fatal corpus error.
#[derive(Debug)]
pub enum CorpusError {
    /// Source directory cannot be listed.
    ListFailed {
        dir: PathBuf,
        source: std::io::Error,
    },
}

impl Display for CorpusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListFailed { dir, source } => {
                write!(f, "cannot list source directory `{}`: {source}", dir.display())
            }
        }
    }
}

impl Error for CorpusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ListFailed { source, .. } => Some(source),
        }
    }
}

/// Non-fatal problem found while loading pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorpusIssue {
    /// File could not be read or has no lines; it was skipped.
    UnreadableSource { path: PathBuf, reason: String },
    /// Several pages share one title; all of them were kept.
    DuplicateTitle { title: String, paths: Vec<PathBuf> },
    /// Tag token that cannot name a directory entry; the tag was dropped.
    RejectedTag { path: PathBuf, tag: String },
}

impl Display for CorpusIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnreadableSource { path, reason } => {
                write!(f, "skipped unreadable page `{}`: {reason}", path.display())
            }
            Self::DuplicateTitle { title, paths } => {
                let joined = paths
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "duplicate title `{title}` in {joined}")
            }
            Self::RejectedTag { path, tag } => {
                write!(f, "ignored tag `{tag}` in `{}`", path.display())
            }
        }
    }
}

/// Loader options taken from `Config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    /// Page extension without the dot.
    pub extension: String,
    /// Require `<uuid>.<ext>` file names.
    pub strict_naming: bool,
}

impl From<&Config> for CorpusOptions {
    fn from(config: &Config) -> Self {
        Self {
            extension: config.page_extension.clone(),
            strict_naming: config.strict_naming,
        }
    }
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            strict_naming: false,
        }
    }
}

/// All pages of one source directory plus load diagnostics.
#[derive(Debug, Clone, Default)]
pub struct PageCorpus {
    source_dir: PathBuf,
    pages: Vec<Page>,
    issues: Vec<CorpusIssue>,
}

impl PageCorpus {
    /// Loads every eligible page in `source_dir`.
    pub fn load(source_dir: &Path, options: &CorpusOptions) -> Result<Self, CorpusError> {
        let started_at = Instant::now();
        info!(
            "event=corpus_load module=corpus status=start dir={}",
            source_dir.display()
        );

        let entries = std::fs::read_dir(source_dir).map_err(|source| CorpusError::ListFailed {
            dir: source_dir.to_path_buf(),
            source,
        })?;

        let mut pages = Vec::new();
        let mut issues = Vec::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(err) => {
                    issues.push(CorpusIssue::UnreadableSource {
                        path: source_dir.to_path_buf(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            if !path.is_file() || !is_eligible_name(&path, options) {
                debug!(
                    "event=corpus_skip module=corpus status=ok reason=ineligible path={}",
                    path.display()
                );
                continue;
            }

            match read_first_line(&path) {
                Ok(line) => {
                    let page = Page::from_title_line(path.clone(), &line);
                    for tag in &page.rejected_tags {
                        issues.push(CorpusIssue::RejectedTag {
                            path: path.clone(),
                            tag: tag.clone(),
                        });
                    }
                    debug!(
                        "event=page_load module=corpus status=ok id={} tags={}",
                        page.id,
                        page.tags.join(",")
                    );
                    pages.push(page);
                }
                Err(reason) => issues.push(CorpusIssue::UnreadableSource { path, reason }),
            }
        }

        pages.sort_by(|left, right| left.id.cmp(&right.id).then(left.path.cmp(&right.path)));
        issues.extend(duplicate_titles(&pages));

        for issue in &issues {
            warn!("event=corpus_issue module=corpus status=warn detail={issue}");
        }

        let corpus = Self {
            source_dir: source_dir.to_path_buf(),
            pages,
            issues,
        };
        info!(
            "event=corpus_load module=corpus status=ok pages={} tagged={} skipped={} duplicates={} duration_ms={}",
            corpus.pages.len(),
            corpus.tagged_pages().count(),
            corpus.skipped_count(),
            corpus.duplicate_title_count(),
            started_at.elapsed().as_millis()
        );
        Ok(corpus)
    }

    /// Builds a corpus from already constructed pages.
    pub fn from_pages(source_dir: impl Into<PathBuf>, mut pages: Vec<Page>) -> Self {
        pages.sort_by(|left, right| left.id.cmp(&right.id).then(left.path.cmp(&right.path)));
        let issues = duplicate_titles(&pages);
        Self {
            source_dir: source_dir.into(),
            pages,
            issues,
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Pages ordered by id.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn tagged_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|page| page.is_tagged())
    }

    pub fn untagged_count(&self) -> usize {
        self.pages.len() - self.tagged_pages().count()
    }

    pub fn page_by_id(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|page| page.id == id)
    }

    pub fn issues(&self) -> &[CorpusIssue] {
        &self.issues
    }

    /// Number of files skipped as unreadable.
    pub fn skipped_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, CorpusIssue::UnreadableSource { .. }))
            .count()
    }

    pub fn duplicate_title_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue, CorpusIssue::DuplicateTitle { .. }))
            .count()
    }
}

/// Returns whether a file name is a page name under `options`.
pub fn is_eligible_name(path: &Path, options: &CorpusOptions) -> bool {
    let extension_matches = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy() == options.extension);
    if !extension_matches {
        return false;
    }
    if !options.strict_naming {
        return true;
    }
    let stem = page_id_for(path);
    stem.len() == HYPHENATED_UUID_LEN && Uuid::try_parse(&stem).is_ok()
}

fn read_first_line(path: &Path) -> Result<String, String> {
    let file = File::open(path).map_err(|err| err.to_string())?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let read = reader.read_line(&mut line).map_err(|err| err.to_string())?;
    if read == 0 {
        return Err("file has no lines".to_string());
    }
    Ok(line)
}

fn duplicate_titles(pages: &[Page]) -> Vec<CorpusIssue> {
    let mut by_title: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();
    for page in pages.iter().filter(|page| !page.title.is_empty()) {
        by_title
            .entry(page.title.as_str())
            .or_default()
            .push(page.path.clone());
    }
    by_title
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(title, paths)| CorpusIssue::DuplicateTitle {
            title: title.to_string(),
            paths,
        })
        .collect()
}
