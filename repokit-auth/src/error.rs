//! Error types for repokit-auth.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from credential and key management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external tool could not be spawned at all.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool ran and exited non-zero.
    #[error("'{program}' failed: {stderr}")]
    Tool { program: String, stderr: String },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.ssh/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// A credential base URL that cannot be split into scheme and host.
    #[error("invalid credential base URL '{url}'")]
    InvalidBaseUrl { url: String },
}

/// Convenience constructor for [`AuthError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> AuthError {
    AuthError::Io {
        path: path.into(),
        source,
    }
}
