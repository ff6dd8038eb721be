//! Domain model for tagged pages and concept identities.
//!
//! # Responsibility
//! - Define the page record loaded from the source directory.
//! - Parse page titles into display text and tag tokens.
//! - Derive canonical concept keys from tag sets.
//!
//! # Invariants
//! - Pages are immutable once loaded.
//! - Two tag sets that are equal after case folding share one `ConceptKey`.

pub mod concept_key;
pub mod page;
pub mod title;
