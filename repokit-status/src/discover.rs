//! Working-copy discovery.
//!
//! Walks the tree depth-first in lexical order, collecting every directory
//! that carries Git metadata (a `.git` directory or file), then filters
//! nested checkouts through an explicit ordered accepted-list: a candidate
//! under an already-accepted path is dropped so embedded/vendored checkouts
//! are never double-reported. The preorder walk guarantees parents are seen
//! before descendants, which the containment check relies on.

use std::path::{Path, PathBuf};

use crate::error::{io_err, StatusError};

/// Discover the repositories to classify under `root`.
pub fn discover_repos(root: &Path) -> Result<Vec<PathBuf>, StatusError> {
    let mut candidates = Vec::new();
    walk(root, &mut candidates)?;
    Ok(accept(candidates))
}

fn walk(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), StatusError> {
    if dir.join(".git").exists() {
        found.push(dir.to_path_buf());
    }

    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_name() == ".git" {
            continue;
        }
        walk(&entry.path(), found)?;
    }
    Ok(())
}

/// Containment filter over preordered candidates.
pub(crate) fn accept(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut accepted: Vec<PathBuf> = Vec::new();
    for candidate in candidates {
        if accepted.iter().any(|prior| candidate.starts_with(prior)) {
            tracing::debug!("skipping nested checkout {}", candidate.display());
            continue;
        }
        accepted.push(candidate);
    }
    accepted
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
