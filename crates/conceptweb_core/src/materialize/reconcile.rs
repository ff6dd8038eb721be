//! Declarative directory-tree sync.
//!
//! # Responsibility
//! - Snapshot every entry below a destination root.
//! - Create or confirm desired directories, symlinks and files.
//! - Sweep whatever the run did not confirm.
//!
//! # Invariants
//! - Nothing outside the root is created, changed or removed.
//! - A desired entry that is already correct is never rewritten.
//! - Sweeping happens only after all desired entries were processed, deepest
//!   paths first; directories go only when empty.
//! - Per-path failures are recorded and never stop the run.

use crate::materialize::{MaterializeError, SyncAction, SyncReport};
use log::{debug, info, warn};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Kind of an entry found in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    Symlink,
    File,
}

/// What happens to unconfirmed regular files during a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SweepPolicy {
    /// Leave regular files alone; only symlinks and empty directories go.
    #[default]
    LinksOnly,
    /// Also remove regular files with this extension.
    LinksAndFiles { extension: String },
}

impl SweepPolicy {
    fn removes_file(&self, path: &Path) -> bool {
        match self {
            Self::LinksOnly => false,
            Self::LinksAndFiles { extension } => path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy() == *extension),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Claim {
    Dir,
    Symlink(PathBuf),
    File(u64),
}

/// One reconciliation pass over a destination root.
#[derive(Debug)]
pub struct Reconciler {
    root: PathBuf,
    module: &'static str,
    verbose: bool,
    remaining: BTreeMap<PathBuf, EntryKind>,
    claimed: HashMap<PathBuf, (Claim, bool)>,
    report: SyncReport,
}

impl Reconciler {
    /// Creates the root when missing and snapshots everything below it.
    ///
    /// `module` names the calling component in log events.
    pub fn snapshot(
        root: impl Into<PathBuf>,
        module: &'static str,
        verbose: bool,
    ) -> Result<Self, MaterializeError> {
        let root = root.into();
        let mut report = SyncReport::default();

        match std::fs::symlink_metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(MaterializeError::RootNotDirectory(root)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                std::fs::create_dir_all(&root).map_err(|source| {
                    MaterializeError::RootUnavailable {
                        path: root.clone(),
                        source,
                    }
                })?;
                report.created_dirs += 1;
            }
            Err(source) => return Err(MaterializeError::RootUnavailable { path: root, source }),
        }

        let mut remaining = BTreeMap::new();
        for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
            match entry {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    let kind = if file_type.is_symlink() {
                        EntryKind::Symlink
                    } else if file_type.is_dir() {
                        EntryKind::Dir
                    } else {
                        EntryKind::File
                    };
                    remaining.insert(entry.into_path(), kind);
                }
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    report.fail(path, SyncAction::Snapshot, err.to_string());
                }
            }
        }

        debug!(
            "event=snapshot module={} status=ok root={} entries={}",
            module,
            root.display(),
            remaining.len()
        );
        Ok(Self {
            root,
            module,
            verbose,
            remaining,
            claimed: HashMap::new(),
            report,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries not yet confirmed by this run.
    pub fn unconfirmed(&self) -> impl Iterator<Item = (&Path, EntryKind)> {
        self.remaining.iter().map(|(path, kind)| (path.as_path(), *kind))
    }

    /// Ensures `path` is a directory. Returns `false` when it could not be.
    pub fn ensure_dir(&mut self, path: &Path) -> bool {
        if path == self.root {
            return true;
        }
        if let Some(result) = self.claimed_outcome(path, &Claim::Dir) {
            return result;
        }
        let result = self.ensure_parent(path) && self.apply_dir(path);
        self.claimed.insert(path.to_path_buf(), (Claim::Dir, result));
        result
    }

    fn apply_dir(&mut self, path: &Path) -> bool {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => {
                self.confirm(path);
                true
            }
            Ok(_) => {
                self.report
                    .fail(path, SyncAction::Occupied, "non-directory entry in the way");
                self.confirm(path);
                false
            }
            Err(err) if err.kind() == ErrorKind::NotFound => match std::fs::create_dir(path) {
                Ok(()) => {
                    self.report.created_dirs += 1;
                    self.log_change("dir_create", path, None);
                    true
                }
                Err(err) => {
                    self.report.fail(path, SyncAction::CreateDir, err.to_string());
                    false
                }
            },
            Err(err) => {
                self.report.fail(path, SyncAction::CreateDir, err.to_string());
                false
            }
        }
    }

    /// Ensures `link` is a symlink pointing at `target`.
    pub fn ensure_symlink(&mut self, link: &Path, target: &Path, target_is_dir: bool) -> bool {
        let claim = Claim::Symlink(target.to_path_buf());
        if let Some(result) = self.claimed_outcome(link, &claim) {
            return result;
        }
        let result = self.ensure_parent(link) && self.apply_symlink(link, target, target_is_dir);
        self.claimed.insert(link.to_path_buf(), (claim, result));
        result
    }

    fn apply_symlink(&mut self, link: &Path, target: &Path, target_is_dir: bool) -> bool {
        match std::fs::symlink_metadata(link) {
            Ok(meta) if meta.file_type().is_symlink() => {
                self.confirm(link);
                let current = std::fs::read_link(link).ok();
                if current.as_deref() == Some(target) {
                    self.report.unchanged += 1;
                    return true;
                }
                if let Err(err) = std::fs::remove_file(link) {
                    self.report.fail(link, SyncAction::ReplaceLink, err.to_string());
                    return false;
                }
                match create_symlink(target, link, target_is_dir) {
                    Ok(()) => {
                        self.report.replaced_links += 1;
                        self.log_change("link_replace", link, Some(target));
                        true
                    }
                    Err(err) => {
                        self.report.fail(link, SyncAction::ReplaceLink, err.to_string());
                        false
                    }
                }
            }
            Ok(_) => {
                self.report
                    .fail(link, SyncAction::Occupied, "non-symlink entry in the way");
                self.confirm(link);
                false
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                match create_symlink(target, link, target_is_dir) {
                    Ok(()) => {
                        self.report.created_links += 1;
                        self.log_change("link_create", link, Some(target));
                        true
                    }
                    Err(err) => {
                        self.report.fail(link, SyncAction::CreateLink, err.to_string());
                        false
                    }
                }
            }
            Err(err) => {
                self.report.fail(link, SyncAction::CreateLink, err.to_string());
                false
            }
        }
    }

    /// Ensures `path` is a regular file holding exactly `contents`.
    pub fn ensure_file(&mut self, path: &Path, contents: &[u8]) -> bool {
        let claim = Claim::File(digest(contents));
        if let Some(result) = self.claimed_outcome(path, &claim) {
            return result;
        }
        let result = self.ensure_parent(path) && self.apply_file(path, contents);
        self.claimed.insert(path.to_path_buf(), (claim, result));
        result
    }

    fn apply_file(&mut self, path: &Path, contents: &[u8]) -> bool {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_file() => {
                self.confirm(path);
                if std::fs::read(path).is_ok_and(|current| current == contents) {
                    self.report.unchanged += 1;
                    return true;
                }
                self.write_file(path, contents)
            }
            Ok(_) => {
                self.report
                    .fail(path, SyncAction::Occupied, "non-file entry in the way");
                self.confirm(path);
                false
            }
            Err(err) if err.kind() == ErrorKind::NotFound => self.write_file(path, contents),
            Err(err) => {
                self.report.fail(path, SyncAction::WriteFile, err.to_string());
                false
            }
        }
    }

    /// Keeps `path` and everything below it exactly as it is.
    pub fn retain_subtree(&mut self, path: &Path) {
        self.remaining.retain(|entry, _| !entry.starts_with(path));
    }

    /// Records a failure that is not tied to a filesystem call.
    pub fn record_failure(&mut self, path: &Path, action: SyncAction, reason: impl Into<String>) {
        self.report.fail(path, action, reason);
    }

    /// Removes every unconfirmed entry allowed by `policy`, deepest first.
    pub fn sweep(mut self, policy: &SweepPolicy) -> SyncReport {
        let mut stale: Vec<(PathBuf, EntryKind)> = std::mem::take(&mut self.remaining)
            .into_iter()
            .collect();
        stale.sort_by(|left, right| {
            right
                .0
                .components()
                .count()
                .cmp(&left.0.components().count())
                .then_with(|| left.0.cmp(&right.0))
        });

        for (path, kind) in stale {
            match kind {
                EntryKind::Symlink => match std::fs::remove_file(&path) {
                    Ok(()) => {
                        self.report.removed_links += 1;
                        self.log_change("link_remove", &path, None);
                    }
                    Err(err) => self.report.fail(&path, SyncAction::Remove, err.to_string()),
                },
                EntryKind::File if policy.removes_file(&path) => {
                    match std::fs::remove_file(&path) {
                        Ok(()) => {
                            self.report.removed_files += 1;
                            self.log_change("file_remove", &path, None);
                        }
                        Err(err) => self.report.fail(&path, SyncAction::Remove, err.to_string()),
                    }
                }
                EntryKind::File => {
                    debug!(
                        "event=sweep_keep module={} status=ok path={}",
                        self.module,
                        path.display()
                    );
                }
                EntryKind::Dir => {
                    let is_empty = match std::fs::read_dir(&path) {
                        Ok(mut entries) => entries.next().is_none(),
                        Err(err) => {
                            self.report.fail(&path, SyncAction::Remove, err.to_string());
                            continue;
                        }
                    };
                    if !is_empty {
                        continue;
                    }
                    match std::fs::remove_dir(&path) {
                        Ok(()) => {
                            self.report.removed_dirs += 1;
                            self.log_change("dir_remove", &path, None);
                        }
                        Err(err) => self.report.fail(&path, SyncAction::Remove, err.to_string()),
                    }
                }
            }
        }

        for failure in &self.report.failures {
            warn!(
                "event=sync_failure module={} status=warn action={} path={} reason={}",
                self.module,
                failure.action,
                failure.path.display(),
                failure.reason
            );
        }
        self.report
    }

    /// Outcome of an earlier claim on `path` this run, if any.
    ///
    /// A repeated identical claim returns the first outcome, so a failed
    /// directory keeps failing for everything below it.
    fn claimed_outcome(&mut self, path: &Path, claim: &Claim) -> Option<bool> {
        match self.claimed.get(path) {
            Some((existing, result)) if existing == claim => Some(*result),
            Some(_) => {
                self.report.fail(
                    path,
                    SyncAction::NameCollision,
                    "path already claimed by another entry",
                );
                Some(false)
            }
            None => None,
        }
    }

    fn ensure_parent(&mut self, path: &Path) -> bool {
        match path.parent() {
            Some(parent) if parent.starts_with(&self.root) => {
                if self.ensure_dir(parent) {
                    return true;
                }
                self.report
                    .fail(path, SyncAction::CreateDir, "parent directory is unavailable");
                false
            }
            _ => {
                self.report
                    .fail(path, SyncAction::CreateDir, "path is outside the destination root");
                false
            }
        }
    }

    fn confirm(&mut self, path: &Path) {
        self.remaining.remove(path);
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> bool {
        match std::fs::write(path, contents) {
            Ok(()) => {
                self.report.written_files += 1;
                self.log_change("file_write", path, None);
                true
            }
            Err(err) => {
                self.report.fail(path, SyncAction::WriteFile, err.to_string());
                false
            }
        }
    }

    fn log_change(&self, event: &str, path: &Path, target: Option<&Path>) {
        let target = target
            .map(|target| format!(" target={}", target.display()))
            .unwrap_or_default();
        if self.verbose {
            info!(
                "event={} module={} status=ok path={}{}",
                event,
                self.module,
                path.display(),
                target
            );
        } else {
            debug!(
                "event={} module={} status=ok path={}{}",
                event,
                self.module,
                path.display(),
                target
            );
        }
    }
}

fn digest(contents: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    contents.hash(&mut hasher);
    hasher.finish()
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path, _target_is_dir: bool) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path, target_is_dir: bool) -> std::io::Result<()> {
    if target_is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_target: &Path, _link: &Path, _target_is_dir: bool) -> std::io::Result<()> {
    Err(std::io::Error::new(
        ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}
