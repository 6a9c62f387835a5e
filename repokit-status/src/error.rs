//! Error types for repokit-status.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the discovery walk.
///
/// Classification failures never surface here; they become an error outcome
/// on the affected repository's row and the scan continues.
#[derive(Debug, Error)]
pub enum StatusError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`StatusError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StatusError {
    StatusError::Io {
        path: path.into(),
        source,
    }
}
