//! Error types for repokit-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::CredentialType;

/// All errors that can arise from manifest loading and validation.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest file did not exist at the expected path.
    #[error("manifest not found at {path}; run `repokit init` to scaffold one")]
    NotFound { path: PathBuf },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.repokit/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// Neither `credential_ssh` nor `credential_gcm` is enabled.
    #[error("no credential strategy enabled; enable credential_ssh or credential_gcm")]
    NoCredentialStrategy,

    /// Two accounts declared the same local folder.
    #[error("accounts '{first}' and '{second}' both use local folder '{}'", .folder.display())]
    DuplicateAccountFolder {
        folder: PathBuf,
        first: String,
        second: String,
    },

    /// An account folder must be relative to the root folder.
    #[error("account '{account}' declares an absolute folder '{}'", .folder.display())]
    AccountFolderAbsolute { account: String, folder: PathBuf },

    /// An account URL without a `scheme://` prefix.
    #[error("account '{account}' has an invalid remote base URL '{url}'")]
    InvalidRemoteUrl { account: String, url: String },

    /// An SSH-mode account is missing a required `ssh_*` field.
    #[error("account '{account}' uses SSH but is missing required field '{field}'")]
    MissingSshField {
        account: String,
        field: &'static str,
    },

    /// No strategy applies to this account under the enabled global settings.
    #[error("account '{account}' matches no enabled credential strategy (declare ssh_host or enable credential_gcm)")]
    NoStrategyForAccount { account: String },

    /// A repo-level `credential_type` that contradicts the account strategy.
    #[error("repo '{repo}' under account '{account}' declares credential_type '{declared}' but the account uses '{active}'")]
    CredentialTypeMismatch {
        account: String,
        repo: String,
        declared: CredentialType,
        active: CredentialType,
    },
}
