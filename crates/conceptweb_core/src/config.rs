//! Run configuration.
//!
//! # Responsibility
//! - Hold every option the components need: directories, verbosity and
//!   naming strictness.
//! - Load options from a TOML file and validate directory relationships.
//!
//! # Invariants
//! - A validated config has absolute, lexically normalized directories.
//! - No destination equals the source directory or contains it.
//! - Index and symlink destinations are distinct and neither lies inside
//!   the other.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

/// File name looked up in the root directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "conceptweb.toml";

const DEFAULT_INDEX_DIR: &str = "web";
const DEFAULT_SYMLINK_DIR: &str = "symlink";
const DEFAULT_PRIMARY_DIR: &str = "concepts";
const DEFAULT_COMBINATION_DIR: &str = ".combinations";
const DEFAULT_PAGE_EXTENSION: &str = "md";

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file is not valid TOML for this schema.
    ParseFailed { path: PathBuf, message: String },
    /// Directory could not be made absolute.
    Unresolvable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Required value is blank.
    EmptyValue(&'static str),
    /// Value must be one plain path component.
    InvalidComponent { field: &'static str, value: String },
    /// Destination is the source directory itself.
    DestinationIsSource(PathBuf),
    /// Source directory lives inside a destination that gets swept.
    SourceInsideDestination {
        source_dir: PathBuf,
        destination: PathBuf,
    },
    /// Index and symlink trees would share one directory.
    SharedDestination(PathBuf),
    /// One destination lies inside the other and would be swept by it.
    NestedDestination { outer: PathBuf, inner: PathBuf },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::ParseFailed { path, message } => {
                write!(f, "failed to parse config `{}`: {message}", path.display())
            }
            Self::Unresolvable { path, source } => {
                write!(f, "cannot resolve path `{}`: {source}", path.display())
            }
            Self::EmptyValue(field) => write!(f, "config value `{field}` must not be empty"),
            Self::InvalidComponent { field, value } => write!(
                f,
                "config value `{field}` must be a single path component, got `{value}`"
            ),
            Self::DestinationIsSource(path) => write!(
                f,
                "destination `{}` is the source directory",
                path.display()
            ),
            Self::SourceInsideDestination {
                source_dir,
                destination,
            } => write!(
                f,
                "source `{}` lies inside destination `{}`",
                source_dir.display(),
                destination.display()
            ),
            Self::SharedDestination(path) => write!(
                f,
                "index and symlink trees cannot share `{}`",
                path.display()
            ),
            Self::NestedDestination { outer, inner } => write!(
                f,
                "destination `{}` lies inside destination `{}`",
                inner.display(),
                outer.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::Unresolvable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Options shared by corpus loading and both materializers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding page files (not scanned recursively).
    pub source_dir: PathBuf,
    /// Destination of index documents.
    pub index_dir: PathBuf,
    /// Destination of the symlink tree.
    pub symlink_dir: PathBuf,
    /// Log every created or removed entry at `info`.
    pub verbose: bool,
    /// Only accept `<uuid>.<ext>` file names.
    pub strict_naming: bool,
    /// Directory for single-tag concepts inside each destination.
    pub primary_dir_name: String,
    /// Hidden directory for tag combinations inside each destination.
    pub combination_dir_name: String,
    /// Page file extension, without the dot.
    pub page_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_root(".")
    }
}

impl Config {
    /// Conventional layout: pages in `root`, `root/web`, `root/symlink`.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            source_dir: root.to_path_buf(),
            index_dir: root.join(DEFAULT_INDEX_DIR),
            symlink_dir: root.join(DEFAULT_SYMLINK_DIR),
            verbose: true,
            strict_naming: false,
            primary_dir_name: DEFAULT_PRIMARY_DIR.to_string(),
            combination_dir_name: DEFAULT_COMBINATION_DIR.to_string(),
            page_extension: DEFAULT_PAGE_EXTENSION.to_string(),
        }
    }

    /// Reads a TOML config. Relative directories resolve against the
    /// directory containing the file.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            toml::from_str(&contents).map_err(|err| ConfigError::ParseFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for dir in [
            &mut config.source_dir,
            &mut config.index_dir,
            &mut config.symlink_dir,
        ] {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        Ok(config)
    }

    /// Returns a copy with absolute normalized directories, validated.
    pub fn resolved(&self) -> Result<Self, ConfigError> {
        let mut resolved = self.clone();
        resolved.source_dir = absolute_normalized(&self.source_dir)?;
        resolved.index_dir = absolute_normalized(&self.index_dir)?;
        resolved.symlink_dir = absolute_normalized(&self.symlink_dir)?;
        resolved.validate()?;
        Ok(resolved)
    }

    /// Checks names and directory relationships.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyValue("source_dir"));
        }
        if self.index_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyValue("index_dir"));
        }
        if self.symlink_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyValue("symlink_dir"));
        }
        require_component("primary_dir_name", &self.primary_dir_name)?;
        require_component("combination_dir_name", &self.combination_dir_name)?;
        require_component("page_extension", &self.page_extension)?;
        if self.page_extension.contains('.') {
            return Err(ConfigError::InvalidComponent {
                field: "page_extension",
                value: self.page_extension.clone(),
            });
        }
        if self.primary_dir_name == self.combination_dir_name {
            return Err(ConfigError::InvalidComponent {
                field: "combination_dir_name",
                value: self.combination_dir_name.clone(),
            });
        }

        if self.index_dir == self.symlink_dir {
            return Err(ConfigError::SharedDestination(self.index_dir.clone()));
        }
        for destination in [&self.index_dir, &self.symlink_dir] {
            if destination == &self.source_dir {
                return Err(ConfigError::DestinationIsSource(destination.clone()));
            }
            if self.source_dir.starts_with(destination) {
                return Err(ConfigError::SourceInsideDestination {
                    source_dir: self.source_dir.clone(),
                    destination: destination.clone(),
                });
            }
        }
        for (outer, inner) in [
            (&self.index_dir, &self.symlink_dir),
            (&self.symlink_dir, &self.index_dir),
        ] {
            if inner.starts_with(outer) {
                return Err(ConfigError::NestedDestination {
                    outer: outer.clone(),
                    inner: inner.clone(),
                });
            }
        }
        Ok(())
    }
}

fn require_component(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(field));
    }
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ConfigError::InvalidComponent {
            field,
            value: value.to_string(),
        }),
    }
}

/// Makes a path absolute and removes `.`/`..` components lexically.
pub fn absolute_normalized(path: &Path) -> Result<PathBuf, ConfigError> {
    let absolute = std::path::absolute(path).map_err(|source| ConfigError::Unresolvable {
        path: path.to_path_buf(),
        source,
    })?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::{absolute_normalized, Config, ConfigError};
    use std::path::{Path, PathBuf};

    #[test]
    fn for_root_uses_conventional_layout() {
        let config = Config::for_root("/notes");
        assert_eq!(config.source_dir, PathBuf::from("/notes"));
        assert_eq!(config.index_dir, PathBuf::from("/notes/web"));
        assert_eq!(config.symlink_dir, PathBuf::from("/notes/symlink"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn destination_equal_to_source_is_rejected() {
        let mut config = Config::for_root("/notes");
        config.index_dir = PathBuf::from("/notes");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DestinationIsSource(_))
        ));
    }

    #[test]
    fn source_inside_destination_is_rejected() {
        let mut config = Config::for_root("/notes/pages");
        config.symlink_dir = PathBuf::from("/notes");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SourceInsideDestination { .. })
        ));
    }

    #[test]
    fn shared_destination_is_rejected() {
        let mut config = Config::for_root("/notes");
        config.symlink_dir = config.index_dir.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SharedDestination(_))
        ));
    }

    #[test]
    fn nested_destinations_are_rejected() {
        let mut config = Config::for_root("/notes");
        config.symlink_dir = PathBuf::from("/notes/web/links");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NestedDestination { outer, .. }) if outer == PathBuf::from("/notes/web")
        ));

        let mut config = Config::for_root("/notes");
        config.index_dir = PathBuf::from("/notes/symlink/web");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NestedDestination { inner, .. })
                if inner == PathBuf::from("/notes/symlink/web")
        ));
    }

    #[test]
    fn directory_names_must_be_single_components() {
        let mut config = Config::for_root("/notes");
        config.primary_dir_name = "a/b".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidComponent { field: "primary_dir_name", .. })
        ));

        let mut config = Config::for_root("/notes");
        config.combination_dir_name = "..".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::for_root("/notes");
        config.page_extension = ".md".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn normalization_removes_dot_components() {
        let normalized = absolute_normalized(Path::new("/notes/./web/../symlink")).unwrap();
        assert_eq!(normalized, PathBuf::from("/notes/symlink"));
    }

    #[test]
    fn toml_paths_resolve_against_file_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conceptweb.toml");
        std::fs::write(
            &path,
            "source_dir = \"pages\"\nindex_dir = \"out/web\"\nverbose = false\nstrict_naming = true\n",
        )
        .unwrap();

        let config = Config::load_toml(&path).unwrap();
        assert_eq!(config.source_dir, dir.path().join("pages"));
        assert_eq!(config.index_dir, dir.path().join("out/web"));
        assert_eq!(config.symlink_dir, dir.path().join("symlink"));
        assert!(!config.verbose);
        assert!(config.strict_naming);
        assert_eq!(config.primary_dir_name, "concepts");
    }

    #[test]
    fn unknown_toml_keys_are_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conceptweb.toml");
        std::fs::write(&path, "colour = \"blue\"\n").unwrap();
        assert!(matches!(
            Config::load_toml(&path),
            Err(ConfigError::ParseFailed { .. })
        ));
    }
}
