//! In-memory concept lattice.
//!
//! # Responsibility
//! - Derive one node per reachable tag combination from the page corpus.
//! - Wire parent -> child edges between sets that differ by one tag.
//!
//! # Invariants
//! - Nodes are keyed by `ConceptKey`; one key never maps to two nodes.
//! - Edge insertion is idempotent.
//! - The graph is rebuilt from scratch on every run and is read-only
//!   once built.

pub mod builder;
pub mod combinations;
pub mod node;
