//! Filesystem projections of the concept lattice.
//!
//! # Responsibility
//! - Render the lattice as cross-linked index documents.
//! - Render the lattice as a directory tree of relative symlinks.
//! - Keep both trees in sync with the current lattice, removing stale entries.
//!
//! # Invariants
//! - Single-tag nodes live under the primary directory, combinations under
//!   the hidden combination directory of the same destination root.
//! - Source pages are never written, moved or removed.

pub mod index;
pub mod reconcile;
pub mod symlink;

use crate::config::Config;
use crate::model::concept_key::ConceptKey;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// Fatal materialization error: the destination root is unusable.
#[derive(Debug)]
pub enum MaterializeError {
    /// Root could not be inspected or created.
    RootUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Root exists but is not a directory.
    RootNotDirectory(PathBuf),
}

impl Display for MaterializeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootUnavailable { path, source } => {
                write!(f, "destination `{}` is unavailable: {source}", path.display())
            }
            Self::RootNotDirectory(path) => {
                write!(f, "destination `{}` is not a directory", path.display())
            }
        }
    }
}

impl Error for MaterializeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RootUnavailable { source, .. } => Some(source),
            Self::RootNotDirectory(_) => None,
        }
    }
}

/// Operation that failed for one destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Snapshot,
    CreateDir,
    CreateLink,
    ReplaceLink,
    WriteFile,
    Remove,
    /// Something that is not ours occupies the desired path.
    Occupied,
    /// Two desired entries map to one path.
    NameCollision,
    /// Node skipped because its edges are inconsistent.
    InvariantViolation,
}

impl Display for SyncAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Snapshot => "snapshot",
            Self::CreateDir => "create_dir",
            Self::CreateLink => "create_link",
            Self::ReplaceLink => "replace_link",
            Self::WriteFile => "write_file",
            Self::Remove => "remove",
            Self::Occupied => "occupied",
            Self::NameCollision => "name_collision",
            Self::InvariantViolation => "invariant_violation",
        };
        f.write_str(name)
    }
}

/// Per-path destination failure; the run carries on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationFailure {
    pub path: PathBuf,
    pub action: SyncAction,
    pub reason: String,
}

impl Display for DestinationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed for `{}`: {}",
            self.action,
            self.path.display(),
            self.reason
        )
    }
}

/// Outcome counts of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created_dirs: usize,
    pub created_links: usize,
    pub replaced_links: usize,
    pub written_files: usize,
    /// Desired links and files that were already correct.
    pub unchanged: usize,
    pub removed_links: usize,
    pub removed_files: usize,
    pub removed_dirs: usize,
    pub failures: Vec<DestinationFailure>,
}

impl SyncReport {
    /// Number of filesystem mutations performed.
    pub fn writes(&self) -> usize {
        self.created_dirs
            + self.created_links
            + self.replaced_links
            + self.written_files
            + self.removed_links
            + self.removed_files
            + self.removed_dirs
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn fail(
        &mut self,
        path: impl Into<PathBuf>,
        action: SyncAction,
        reason: impl Into<String>,
    ) {
        self.failures.push(DestinationFailure {
            path: path.into(),
            action,
            reason: reason.into(),
        });
    }
}

/// Directory layout shared by both projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLayout {
    pub root: PathBuf,
    pub primary_dir_name: String,
    pub combination_dir_name: String,
}

impl TreeLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        primary_dir_name: impl Into<String>,
        combination_dir_name: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            primary_dir_name: primary_dir_name.into(),
            combination_dir_name: combination_dir_name.into(),
        }
    }

    /// Layout of the index tree described by `config`.
    pub fn index(config: &Config) -> Self {
        Self::new(
            &config.index_dir,
            &config.primary_dir_name,
            &config.combination_dir_name,
        )
    }

    /// Layout of the symlink tree described by `config`.
    pub fn symlink(config: &Config) -> Self {
        Self::new(
            &config.symlink_dir,
            &config.primary_dir_name,
            &config.combination_dir_name,
        )
    }

    pub fn primary_dir(&self) -> PathBuf {
        self.root.join(&self.primary_dir_name)
    }

    pub fn combination_dir(&self) -> PathBuf {
        self.root.join(&self.combination_dir_name)
    }

    /// Directory that holds the entry for `key`.
    pub fn group_dir(&self, key: &ConceptKey) -> PathBuf {
        if key.is_single() {
            self.primary_dir()
        } else {
            self.combination_dir()
        }
    }

    /// Path of the entry for `key`, with an optional extension.
    pub fn entry_path(&self, key: &ConceptKey, extension: Option<&str>) -> PathBuf {
        let name = match extension {
            Some(ext) => format!("{}.{ext}", key.identity()),
            None => key.identity().to_string(),
        };
        self.group_dir(key).join(name)
    }
}

/// Relative path leading from directory `from` to `to`.
///
/// Both paths must be absolute and normalized.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from_parts: Vec<Component<'_>> = from.components().collect();
    let to_parts: Vec<Component<'_>> = to.components().collect();
    let shared = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(left, right)| left == right)
        .count();

    let mut relative = PathBuf::new();
    for _ in shared..from_parts.len() {
        relative.push("..");
    }
    for part in &to_parts[shared..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Relative path rendered with `/` separators, for markdown links.
pub fn relative_link(from: &Path, to: &Path) -> String {
    relative_path(from, to)
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::{relative_link, relative_path, SyncReport, TreeLayout};
    use crate::model::concept_key::ConceptKey;
    use std::path::{Path, PathBuf};

    #[test]
    fn relative_path_walks_up_and_down() {
        assert_eq!(
            relative_path(Path::new("/n/symlink/concepts/Food"), Path::new("/n/page.md")),
            PathBuf::from("../../../page.md")
        );
        assert_eq!(
            relative_path(Path::new("/n/web/.combinations"), Path::new("/n/web/.combinations/x.md")),
            PathBuf::from("x.md")
        );
        assert_eq!(relative_path(Path::new("/n"), Path::new("/n")), PathBuf::from("."));
    }

    #[test]
    fn relative_link_uses_forward_slashes() {
        assert_eq!(
            relative_link(Path::new("/n/web/concepts"), Path::new("/n/web/.combinations/ab.md")),
            "../.combinations/ab.md"
        );
    }

    #[test]
    fn layout_places_combinations_in_hidden_dir() {
        let layout = TreeLayout::new("/n/symlink", "concepts", ".combinations");
        let single = ConceptKey::from_tags(&["Food"]).unwrap();
        let pair = ConceptKey::from_tags(&["Food", "Drink"]).unwrap();
        assert_eq!(
            layout.entry_path(&single, Some("md")),
            PathBuf::from("/n/symlink/concepts/Food.md")
        );
        assert_eq!(
            layout.entry_path(&pair, None),
            PathBuf::from(format!("/n/symlink/.combinations/{}", pair.identity()))
        );
    }

    #[test]
    fn writes_sum_every_mutation() {
        let report = SyncReport {
            created_dirs: 1,
            created_links: 2,
            removed_dirs: 3,
            unchanged: 10,
            ..SyncReport::default()
        };
        assert_eq!(report.writes(), 6);
    }
}
