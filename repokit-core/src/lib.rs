//! Repokit core library — manifest types, loading, validation, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and manifest structs
//! - [`error`] — [`ManifestError`]
//! - [`manifest`] — load / validate / default path

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ManifestError;
pub use types::{
    Account, AccountName, CredentialType, GcmSettings, Global, Manifest, RepoEntry, RepoName,
    SshSettings,
};
