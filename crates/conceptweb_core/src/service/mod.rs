//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate corpus loading, lattice construction and both projections.
//! - Keep the CLI decoupled from component wiring and configuration checks.

pub mod page_service;
pub mod web_service;
