//! Page corpus loading and page-level diagnostics.
//!
//! # Responsibility
//! - Enumerate eligible page files in the source directory.
//! - Report unreadable files, duplicate titles and refused tags.
//! - Check cross-page links inside page bodies.

pub mod links;
pub mod loader;
