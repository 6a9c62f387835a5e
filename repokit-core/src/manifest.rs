//! Manifest loading and whole-document validation.
//!
//! # Storage layout
//!
//! ```text
//! ~/.repokit/
//!   manifest.yaml    (user-edited declaration; never written by the tool
//!                     except by `repokit init` scaffolding)
//! ```
//!
//! # API pattern
//!
//! Every reading function has two forms:
//! - `fn_at(path: &Path)` — explicit path; used in tests with `TempDir`
//! - `fn()` — derives the path from `dirs::home_dir()`, delegates to `_at`
//!
//! Validation is all-or-nothing: [`load_at`] validates the entire document
//! and fails before any caller can attempt a side effect.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ManifestError;
use crate::types::Manifest;

/// `<home>/.repokit/manifest.yaml` — pure, no I/O beyond home lookup.
pub fn default_path() -> Result<PathBuf, ManifestError> {
    let home = dirs::home_dir().ok_or(ManifestError::HomeNotFound)?;
    Ok(home.join(".repokit").join("manifest.yaml"))
}

/// Load and validate the manifest at `path`.
///
/// Returns `ManifestError::NotFound` if absent, `ManifestError::Parse`
/// (with path + line context) if malformed YAML, or a validation error.
pub fn load_at(path: &Path) -> Result<Manifest, ManifestError> {
    if !path.exists() {
        return Err(ManifestError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let mut manifest: Manifest =
        serde_yaml::from_str(&contents).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
    expand_home(&mut manifest)?;
    validate(&manifest)?;
    Ok(manifest)
}

/// Expand a leading `~/` in the paths a user plausibly writes one into:
/// the root folder, the ssh folder, and absolute repo folder overrides.
fn expand_home(manifest: &mut Manifest) -> Result<(), ManifestError> {
    let needs_home = |p: &Path| p.starts_with("~");
    let mut paths: Vec<&mut PathBuf> = vec![&mut manifest.global.folder];
    if let Some(ssh) = manifest.global.credential_ssh.as_mut() {
        paths.push(&mut ssh.ssh_folder);
    }
    for account in manifest.accounts.values_mut() {
        for entry in account.repos.values_mut() {
            if let Some(folder) = entry.folder.as_mut() {
                paths.push(folder);
            }
        }
    }

    if !paths.iter().any(|p| needs_home(p)) {
        return Ok(());
    }
    let home = dirs::home_dir().ok_or(ManifestError::HomeNotFound)?;
    for path in paths {
        if let Ok(rest) = path.strip_prefix("~") {
            *path = home.join(rest);
        }
    }
    Ok(())
}

/// `load_at` convenience wrapper using the default path.
pub fn load() -> Result<Manifest, ManifestError> {
    load_at(&default_path()?)
}

/// Validate a parsed manifest against the declaration rules.
///
/// Checks, in order: a credential strategy is enabled; every account URL has
/// a scheme; account folders are relative and unique; SSH-mode accounts carry
/// all `ssh_*` fields; repo-level `credential_type` matches the account
/// strategy.
pub fn validate(manifest: &Manifest) -> Result<(), ManifestError> {
    let global = &manifest.global;
    if !global.ssh_enabled() && !global.gcm_enabled() {
        return Err(ManifestError::NoCredentialStrategy);
    }

    let mut folders: BTreeMap<PathBuf, String> = BTreeMap::new();
    for (account_name, account) in &manifest.accounts {
        if !account.url.contains("://") {
            return Err(ManifestError::InvalidRemoteUrl {
                account: account_name.0.clone(),
                url: account.url.clone(),
            });
        }
        if account.folder.is_absolute() {
            return Err(ManifestError::AccountFolderAbsolute {
                account: account_name.0.clone(),
                folder: account.folder.clone(),
            });
        }
        if let Some(first) = folders.get(&account.folder) {
            return Err(ManifestError::DuplicateAccountFolder {
                folder: account.folder.clone(),
                first: first.clone(),
                second: account_name.0.clone(),
            });
        }
        folders.insert(account.folder.clone(), account_name.0.clone());

        let Some(strategy) = account.strategy(global) else {
            return Err(ManifestError::NoStrategyForAccount {
                account: account_name.0.clone(),
            });
        };

        if strategy == crate::types::CredentialType::Ssh {
            if account.ssh_hostname.is_none() {
                return Err(ManifestError::MissingSshField {
                    account: account_name.0.clone(),
                    field: "ssh_hostname",
                });
            }
            if account.ssh_type.is_none() {
                return Err(ManifestError::MissingSshField {
                    account: account_name.0.clone(),
                    field: "ssh_type",
                });
            }
        }

        for (repo_name, entry) in &account.repos {
            if let Some(declared) = entry.credential_type {
                if declared != strategy {
                    return Err(ManifestError::CredentialTypeMismatch {
                        account: account_name.0.clone(),
                        repo: repo_name.0.clone(),
                        declared,
                        active: strategy,
                    });
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    const MINIMAL_GCM: &str = r#"
global:
  folder: /home/me/src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts:
  work:
    url: https://github.com/acme
    username: me
    folder: work
    repos:
      widget-api: {}
"#;

    fn write_manifest(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("manifest.yaml");
        fs::write(&path, contents).expect("write manifest");
        path
    }

    #[test]
    fn load_minimal_manifest() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_manifest(&dir, MINIMAL_GCM);
        let manifest = load_at(&path).expect("load");
        assert_eq!(manifest.accounts.len(), 1);
        let account = manifest.accounts.values().next().expect("account");
        assert_eq!(account.repos.len(), 1);
    }

    #[test]
    fn load_missing_returns_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = load_at(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
    }

    #[test]
    fn load_malformed_yaml_reports_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_manifest(&dir, "global: [not\n  a mapping");
        let err = load_at(&path).unwrap_err();
        match err {
            ManifestError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_manifest_without_strategy() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_manifest(
            &dir,
            "global:\n  folder: /src\n  credential_gcm: { enabled: false, helper: h, credentialStore: c }\n",
        );
        let err = load_at(&path).unwrap_err();
        assert!(matches!(err, ManifestError::NoCredentialStrategy));
    }

    #[test]
    fn rejects_duplicate_account_folders() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts:
  one:
    url: https://github.com/a
    username: a
    folder: same
  two:
    url: https://github.com/b
    username: b
    folder: same
"#;
        let path = write_manifest(&dir, doc);
        let err = load_at(&path).unwrap_err();
        match err {
            ManifestError::DuplicateAccountFolder { first, second, .. } => {
                assert_eq!(first, "one");
                assert_eq!(second, "two");
            }
            other => panic!("expected duplicate folder error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_absolute_account_folder() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts:
  work:
    url: https://github.com/acme
    username: me
    folder: /elsewhere
"#;
        let path = write_manifest(&dir, doc);
        let err = load_at(&path).unwrap_err();
        assert!(matches!(err, ManifestError::AccountFolderAbsolute { .. }));
    }

    #[test]
    fn rejects_url_without_scheme() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts:
  work:
    url: github.com/acme
    username: me
    folder: work
"#;
        let path = write_manifest(&dir, doc);
        let err = load_at(&path).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidRemoteUrl { .. }));
    }

    #[test]
    fn ssh_account_requires_hostname_and_type() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_ssh: { enabled: true, ssh_folder: /home/me/.ssh }
accounts:
  work:
    url: https://github.com/acme
    username: me
    folder: work
    ssh_host: github-acme
"#;
        let path = write_manifest(&dir, doc);
        let err = load_at(&path).unwrap_err();
        match err {
            ManifestError::MissingSshField { field, .. } => assert_eq!(field, "ssh_hostname"),
            other => panic!("expected missing ssh field, got {other:?}"),
        }
    }

    #[test]
    fn ssh_enabled_account_without_host_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_ssh: { enabled: true, ssh_folder: /home/me/.ssh }
accounts:
  work:
    url: https://github.com/acme
    username: me
    folder: work
"#;
        let path = write_manifest(&dir, doc);
        let err = load_at(&path).unwrap_err();
        assert!(matches!(err, ManifestError::NoStrategyForAccount { .. }));
    }

    #[test]
    fn rejects_repo_credential_type_mismatch() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts:
  work:
    url: https://github.com/acme
    username: me
    folder: work
    repos:
      widget-api: { credential_type: ssh }
"#;
        let path = write_manifest(&dir, doc);
        let err = load_at(&path).unwrap_err();
        assert!(matches!(err, ManifestError::CredentialTypeMismatch { .. }));
    }

    #[test]
    fn tilde_paths_expand_against_home() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: ~/src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts: {}
"#;
        let path = write_manifest(&dir, doc);
        let manifest = load_at(&path).expect("load");
        assert!(
            !manifest.global.folder.starts_with("~"),
            "expected tilde expansion, got {}",
            manifest.global.folder.display()
        );
        assert!(manifest.global.folder.ends_with("src"));
    }

    #[test]
    fn matching_repo_credential_type_is_accepted() {
        let dir = TempDir::new().expect("tempdir");
        let doc = r#"
global:
  folder: /src
  credential_gcm: { enabled: true, helper: manager, credentialStore: cache }
accounts:
  work:
    url: https://github.com/acme
    username: me
    folder: work
    repos:
      widget-api: { credential_type: gcm }
"#;
        let path = write_manifest(&dir, doc);
        load_at(&path).expect("load");
    }
}
