//! Domain types for the repokit manifest.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde + serde_yaml. Field
//! names mirror the declared manifest document, so a couple of keys carry
//! explicit `rename` attributes (`credentialStore`, `gcm_useHttpPath`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a hosting account entry in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountName(pub String);

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AccountName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a remote repository within an account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Credential strategy for an account or (as a constraint) a single repo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    Ssh,
    Gcm,
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialType::Ssh => write!(f, "ssh"),
            CredentialType::Gcm => write!(f, "gcm"),
        }
    }
}

// ---------------------------------------------------------------------------
// Global section
// ---------------------------------------------------------------------------

/// SSH credential settings under `global.credential_ssh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SshSettings {
    pub enabled: bool,
    /// Directory holding key pairs and the managed config fragment.
    pub ssh_folder: PathBuf,
}

/// Git Credential Manager settings under `global.credential_gcm`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GcmSettings {
    pub enabled: bool,
    /// Helper name as understood by `git credential-<helper>`.
    pub helper: String,
    #[serde(rename = "credentialStore")]
    pub credential_store: String,
}

/// The `global` section of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Global {
    /// Root of the checkout tree; created if absent.
    pub folder: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ssh: Option<SshSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_gcm: Option<GcmSettings>,
}

impl Global {
    pub fn ssh_enabled(&self) -> bool {
        self.credential_ssh.as_ref().map(|s| s.enabled).unwrap_or(false)
    }

    pub fn gcm_enabled(&self) -> bool {
        self.credential_gcm.as_ref().map(|s| s.enabled).unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Accounts and repositories
// ---------------------------------------------------------------------------

/// A declared repository under an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RepoEntry {
    /// Identity name override; falls back to the account's `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Identity email override; falls back to the account's `email`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Target folder override: absolute, or relative to the account folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<PathBuf>,
    /// Must match the account's active strategy when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_type: Option<CredentialType>,
}

/// A declared hosting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Account {
    /// Remote base URL, e.g. `https://github.com/acme`.
    pub url: String,
    pub username: String,
    /// Local folder, relative to `global.folder`; unique across accounts.
    pub folder: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcm_provider: Option<String>,
    #[serde(
        default,
        rename = "gcm_useHttpPath",
        skip_serializing_if = "Option::is_none"
    )]
    pub gcm_use_http_path: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_type: Option<String>,
    #[serde(default)]
    pub repos: BTreeMap<RepoName, RepoEntry>,
}

impl Account {
    /// Scheme + host portion of [`Account::url`], e.g. `https://github.com`.
    ///
    /// Returns `None` when the URL has no `://` separator; validation rejects
    /// such manifests before anything consumes this.
    pub fn credential_base_url(&self) -> Option<String> {
        let (scheme, rest) = self.url.split_once("://")?;
        let host = rest.split('/').next().unwrap_or(rest);
        Some(format!("{scheme}://{host}"))
    }

    /// Host portion of [`Account::url`], without the scheme.
    pub fn host(&self) -> Option<&str> {
        let (_, rest) = self.url.split_once("://")?;
        Some(rest.split('/').next().unwrap_or(rest))
    }

    /// Owner path segment of [`Account::url`] (`acme` in
    /// `https://github.com/acme`); falls back to `username` when the URL
    /// carries no path.
    pub fn owner_segment(&self) -> &str {
        let path = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(self.url.as_str());
        match path.split_once('/') {
            Some((_, owner)) if !owner.trim_matches('/').is_empty() => owner.trim_matches('/'),
            _ => self.username.as_str(),
        }
    }

    /// The credential strategy this account operates under, given the global
    /// settings: SSH when globally enabled and `ssh_host` is declared,
    /// otherwise GCM when globally enabled.
    pub fn strategy(&self, global: &Global) -> Option<CredentialType> {
        if global.ssh_enabled() && self.ssh_host.is_some() {
            return Some(CredentialType::Ssh);
        }
        if global.gcm_enabled() {
            return Some(CredentialType::Gcm);
        }
        None
    }

    /// Most specific identity name for `entry` (repo override, else account).
    pub fn name_for<'a>(&'a self, entry: &'a RepoEntry) -> Option<&'a str> {
        entry.name.as_deref().or(self.name.as_deref())
    }

    /// Most specific identity email for `entry` (repo override, else account).
    pub fn email_for<'a>(&'a self, entry: &'a RepoEntry) -> Option<&'a str> {
        entry.email.as_deref().or(self.email.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Manifest root
// ---------------------------------------------------------------------------

/// Root of the repokit YAML manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub global: Global,
    #[serde(default)]
    pub accounts: BTreeMap<AccountName, Account>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
