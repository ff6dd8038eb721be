//! Core domain logic for conceptweb.
//! Turns tagged markdown pages into a concept lattice and keeps two
//! filesystem projections of it (index documents and a symlink tree) in sync.

pub mod config;
pub mod corpus;
pub mod lattice;
pub mod logging;
pub mod materialize;
pub mod model;
pub mod service;

pub use config::{Config, ConfigError, DEFAULT_CONFIG_FILE};
pub use corpus::links::{check_page_links, DanglingLink, LinkReport};
pub use corpus::loader::{CorpusError, CorpusIssue, CorpusOptions, PageCorpus};
pub use lattice::builder::{Lattice, LatticeBuilder, LatticeStats};
pub use lattice::node::{ConceptNode, LatticeInvariantViolation};
pub use logging::{init_logging, level_for_verbosity, logging_status};
pub use materialize::index::IndexMaterializer;
pub use materialize::reconcile::{Reconciler, SweepPolicy};
pub use materialize::symlink::SymlinkMaterializer;
pub use materialize::{DestinationFailure, MaterializeError, SyncAction, SyncReport, TreeLayout};
pub use model::concept_key::ConceptKey;
pub use model::page::Page;
pub use service::web_service::{
    CheckReport, ConceptWebService, CorpusSummary, RunSummary, RunTargets, ServiceError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
