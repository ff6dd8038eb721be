//! Concept web use-case service.
//!
//! # Responsibility
//! - Validate configuration once and hand it to every component.
//! - Run corpus load, lattice build and the requested projections in order.
//! - Produce serializable summaries for callers and `--json` output.
//!
//! # Invariants
//! - Projections run strictly one after another against their own roots.
//! - Per-page and per-path problems end up in the summary, never as `Err`.

use crate::config::{Config, ConfigError};
use crate::corpus::links::{check_page_links, LinkReport};
use crate::corpus::loader::{CorpusError, CorpusIssue, CorpusOptions, PageCorpus};
use crate::lattice::builder::{Lattice, LatticeStats};
use crate::materialize::index::IndexMaterializer;
use crate::materialize::symlink::SymlinkMaterializer;
use crate::materialize::{MaterializeError, SyncReport};
use crate::service::page_service::create_page;
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Errors that stop a whole service call.
#[derive(Debug)]
pub enum ServiceError {
    Config(ConfigError),
    Corpus(CorpusError),
    Materialize(MaterializeError),
    /// New page could not be created.
    PageCreate {
        dir: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Corpus(err) => write!(f, "{err}"),
            Self::Materialize(err) => write!(f, "{err}"),
            Self::PageCreate { dir, source } => {
                write!(f, "failed to create page in `{}`: {source}", dir.display())
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Corpus(err) => Some(err),
            Self::Materialize(err) => Some(err),
            Self::PageCreate { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<CorpusError> for ServiceError {
    fn from(value: CorpusError) -> Self {
        Self::Corpus(value)
    }
}

impl From<MaterializeError> for ServiceError {
    fn from(value: MaterializeError) -> Self {
        Self::Materialize(value)
    }
}

/// Which projections a run should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTargets {
    pub index: bool,
    pub symlinks: bool,
}

impl RunTargets {
    pub fn all() -> Self {
        Self {
            index: true,
            symlinks: true,
        }
    }

    pub fn index_only() -> Self {
        Self {
            index: true,
            symlinks: false,
        }
    }

    pub fn symlinks_only() -> Self {
        Self {
            index: false,
            symlinks: true,
        }
    }
}

/// Corpus counts plus every load diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub pages: usize,
    pub tagged: usize,
    pub untagged: usize,
    pub skipped: usize,
    pub duplicate_titles: usize,
    pub issues: Vec<CorpusIssue>,
}

impl CorpusSummary {
    pub fn of(corpus: &PageCorpus) -> Self {
        Self {
            pages: corpus.len(),
            tagged: corpus.tagged_pages().count(),
            untagged: corpus.untagged_count(),
            skipped: corpus.skipped_count(),
            duplicate_titles: corpus.duplicate_title_count(),
            issues: corpus.issues().to_vec(),
        }
    }
}

/// Outcome of one `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub corpus: CorpusSummary,
    pub lattice: LatticeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symlinks: Option<SyncReport>,
}

impl RunSummary {
    /// Filesystem mutations over both projections.
    pub fn writes(&self) -> usize {
        self.reports().map(SyncReport::writes).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.reports().map(|report| report.failures.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    fn reports(&self) -> impl Iterator<Item = &SyncReport> {
        self.index.iter().chain(self.symlinks.iter())
    }
}

/// Outcome of `check`: diagnostics only, nothing is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub corpus: CorpusSummary,
    pub lattice: LatticeStats,
    pub links: LinkReport,
    /// Lattice invariant violations, one line each.
    pub invariant_violations: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.corpus.issues.is_empty()
            && self.links.dangling.is_empty()
            && self.links.unreadable.is_empty()
            && self.invariant_violations.is_empty()
    }
}

/// Facade over every component, built from one validated config.
#[derive(Debug, Clone)]
pub struct ConceptWebService {
    config: Config,
}

impl ConceptWebService {
    /// Resolves and validates `config`.
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let config = config.resolved()?;
        Ok(Self { config })
    }

    /// Effective configuration with absolute directories.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_corpus(&self) -> Result<PageCorpus, ServiceError> {
        let options = CorpusOptions::from(&self.config);
        Ok(PageCorpus::load(&self.config.source_dir, &options)?)
    }

    pub fn build_lattice<'c>(&self, corpus: &'c PageCorpus) -> Lattice<'c> {
        Lattice::build(corpus)
    }

    pub fn write_index(&self, lattice: &Lattice<'_>) -> Result<SyncReport, ServiceError> {
        Ok(IndexMaterializer::from_config(&self.config).materialize(lattice)?)
    }

    pub fn sync_symlinks(&self, lattice: &Lattice<'_>) -> Result<SyncReport, ServiceError> {
        Ok(SymlinkMaterializer::from_config(&self.config).materialize(lattice)?)
    }

    /// Loads the corpus and produces the requested projections.
    pub fn run(&self, targets: RunTargets) -> Result<RunSummary, ServiceError> {
        let started_at = Instant::now();
        let corpus = self.load_corpus()?;
        let lattice = self.build_lattice(&corpus);

        let index = if targets.index {
            Some(self.write_index(&lattice)?)
        } else {
            None
        };
        let symlinks = if targets.symlinks {
            Some(self.sync_symlinks(&lattice)?)
        } else {
            None
        };

        let summary = RunSummary {
            corpus: CorpusSummary::of(&corpus),
            lattice: lattice.stats(),
            index,
            symlinks,
        };
        info!(
            "event=run module=service status={} nodes={} writes={} failures={} duration_ms={}",
            if summary.has_failures() { "warn" } else { "ok" },
            summary.lattice.nodes,
            summary.writes(),
            summary.failure_count(),
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }

    /// Corpus to lattice to both projections.
    pub fn run_all(&self) -> Result<RunSummary, ServiceError> {
        self.run(RunTargets::all())
    }

    /// Reports diagnostics without touching any destination.
    pub fn check(&self) -> Result<CheckReport, ServiceError> {
        let corpus = self.load_corpus()?;
        let lattice = self.build_lattice(&corpus);

        let mut invariant_violations = Vec::new();
        for node in lattice.nodes() {
            if let Err(err) = lattice.labeled_children(node) {
                invariant_violations.push(err.to_string());
            }
        }

        let report = CheckReport {
            corpus: CorpusSummary::of(&corpus),
            lattice: lattice.stats(),
            links: check_page_links(&corpus, &self.config.page_extension),
            invariant_violations,
        };
        info!(
            "event=check module=service status={} issues={} dangling={}",
            if report.is_clean() { "ok" } else { "warn" },
            report.corpus.issues.len(),
            report.links.dangling.len()
        );
        Ok(report)
    }

    /// Creates an empty page in the source directory.
    pub fn new_page(&self) -> Result<PathBuf, ServiceError> {
        let dir = &self.config.source_dir;
        create_page(dir, &self.config.page_extension).map_err(|source| {
            ServiceError::PageCreate {
                dir: dir.clone(),
                source,
            }
        })
    }
}
