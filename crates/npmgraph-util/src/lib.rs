//! Shared utilities for npmgraph.
//!
//! This crate provides cross-cutting concerns used by all other npmgraph
//! crates: error types, filesystem helpers and terminal status output.

pub mod errors;
pub mod fs;
pub mod progress;

use std::path::{Path, PathBuf};

/// Returns the path to the npmgraph data directory (`~/.npmgraph/`).
pub fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".npmgraph")
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = std::env::var("HOME")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".to_string());
            Path::new(&home).join(rest)
        }
        None => PathBuf::from(path),
    }
}
