//! Error types for repokit-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Run-aborting errors from the reconciler.
///
/// Everything per-repository (clone failure, a failed convergence step) is
/// reported as data inside the sync report, not raised here.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Structural directory creation failed (root or an account folder).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.ssh/config`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
