//! Page creation.
//!
//! # Invariants
//! - A new page never overwrites an existing file.
//! - The page name is `<uuid-v4>.<extension>`, so it passes strict naming.

use log::info;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const CREATE_ATTEMPTS: usize = 4;

/// Heading written into a new page, ready for a title.
pub const NEW_PAGE_CONTENT: &str = "# \n";

/// Creates an empty page in `source_dir` and returns its path.
pub fn create_page(source_dir: &Path, extension: &str) -> std::io::Result<PathBuf> {
    let mut last_err = None;
    for _ in 0..CREATE_ATTEMPTS {
        let path = source_dir.join(format!("{}.{extension}", Uuid::new_v4()));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(NEW_PAGE_CONTENT.as_bytes())?;
                info!(
                    "event=page_create module=service status=ok path={}",
                    path.display()
                );
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => last_err = Some(err),
            Err(err) => return Err(err),
        }
    }
    Err(last_err.unwrap_or_else(|| std::io::Error::from(ErrorKind::AlreadyExists)))
}
