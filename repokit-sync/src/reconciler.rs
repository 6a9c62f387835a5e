//! The repository reconciler.
//!
//! Per declared repository, on return: a working copy exists at the resolved
//! target path; its `origin` fetch and push URLs equal the plain declared
//! remote URL (never the credential-embedded clone URL); its identity equals
//! the most specific declared value; HTTPS mode carries the credential
//! username hint.
//!
//! Convergence is idempotent: every setting is read first and written only
//! when it differs, so a second run with an unchanged manifest performs no
//! net change. Per-repository failures are collected into the report and the
//! loop continues; only structural directory creation aborts the run.

use std::path::{Path, PathBuf};

use repokit_auth::probe::CredentialStoreProbe;
use repokit_auth::{gcm, ssh, HostStanza};
use repokit_core::types::{Account, AccountName, CredentialType, Manifest, RepoEntry, RepoName};
use repokit_git::Git;

use crate::error::{io_err, SyncError};
use crate::paths::{https_clone_url, remote_url, resolve_repo_dir, ssh_clone_url};

// ---------------------------------------------------------------------------
// Options and report types
// ---------------------------------------------------------------------------

/// Options for a reconcile run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Report what would change without touching the filesystem, the key
    /// store, or any repository.
    pub dry_run: bool,
}

/// What happened to a single declared repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoAction {
    /// The working copy was missing and has been cloned.
    Cloned,
    /// The working copy already existed.
    Existing,
    /// `--dry-run`: the working copy is missing and *would* be cloned.
    WouldClone,
    /// Clone failed; configuration was skipped, the run continued.
    CloneFailed { message: String },
}

/// Per-repository result.
#[derive(Debug, Clone)]
pub struct RepoReport {
    pub repo: RepoName,
    pub dir: PathBuf,
    pub action: RepoAction,
    /// Settings applied (or, under dry-run, that would be applied).
    pub changes: Vec<String>,
    /// Non-fatal step failures, reported inline.
    pub issues: Vec<String>,
}

impl RepoReport {
    /// Already at the declared state: exists, nothing changed, no failures.
    pub fn is_settled(&self) -> bool {
        self.action == RepoAction::Existing && self.changes.is_empty() && self.issues.is_empty()
    }
}

/// Per-account result.
#[derive(Debug, Clone)]
pub struct AccountReport {
    pub account: AccountName,
    /// Credential pre-flight problems (missing helper, agent unreachable, …).
    pub preflight: Vec<String>,
    pub repos: Vec<RepoReport>,
}

/// Whole-run result.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Run-level notes (ssh fragment regeneration, include insertion).
    pub notes: Vec<String>,
    pub accounts: Vec<AccountReport>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Reconcile every declared account and repository.
///
/// `ssh_config` is the user's main ssh client config (the include target);
/// tests pass a `TempDir` path, [`reconcile`] derives `~/.ssh/config`.
pub fn reconcile_at(
    ssh_config: &Path,
    manifest: &Manifest,
    git: &Git,
    probe: &dyn CredentialStoreProbe,
    opts: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    let root = &manifest.global.folder;
    std::fs::create_dir_all(root).map_err(|e| io_err(root, e))?;

    let mut report = SyncReport::default();
    if !opts.dry_run {
        regenerate_ssh_fragment(ssh_config, manifest, &mut report.notes);
    }

    for (name, account) in &manifest.accounts {
        let mut acc_report = AccountReport {
            account: name.clone(),
            preflight: Vec::new(),
            repos: Vec::new(),
        };

        let account_dir = root.join(&account.folder);
        std::fs::create_dir_all(&account_dir).map_err(|e| io_err(&account_dir, e))?;

        let Some(strategy) = account.strategy(&manifest.global) else {
            acc_report
                .preflight
                .push("no enabled credential strategy applies".to_string());
            report.accounts.push(acc_report);
            continue;
        };

        if !opts.dry_run {
            match strategy {
                CredentialType::Ssh => {
                    ssh_preflight(manifest, account, &mut acc_report.preflight)
                }
                CredentialType::Gcm => gcm_preflight(account, probe, &mut acc_report.preflight),
            }
        }

        for (repo, entry) in &account.repos {
            acc_report
                .repos
                .push(process_repo(git, account, &account_dir, repo, entry, strategy, opts));
        }

        report.accounts.push(acc_report);
    }

    Ok(report)
}

/// `reconcile_at` convenience wrapper targeting `~/.ssh/config`.
pub fn reconcile(
    manifest: &Manifest,
    git: &Git,
    probe: &dyn CredentialStoreProbe,
    opts: &SyncOptions,
) -> Result<SyncReport, SyncError> {
    let ssh_config = ssh::default_config_path().map_err(|_| SyncError::HomeNotFound)?;
    reconcile_at(&ssh_config, manifest, git, probe, opts)
}

// ---------------------------------------------------------------------------
// Pre-flights
// ---------------------------------------------------------------------------

/// Rewrite the managed fragment with one stanza per SSH-mode account and make
/// sure the main config includes it. Runs once per run, before the account
/// loop, so removed accounts drop out of the fragment.
fn regenerate_ssh_fragment(ssh_config: &Path, manifest: &Manifest, notes: &mut Vec<String>) {
    let Some(settings) = manifest
        .global
        .credential_ssh
        .as_ref()
        .filter(|s| s.enabled)
    else {
        return;
    };

    let stanzas: Vec<HostStanza> = manifest
        .accounts
        .values()
        .filter_map(|account| {
            let alias = account.ssh_host.clone()?;
            let hostname = account.ssh_hostname.clone()?;
            let identity_file = ssh::key_path(&settings.ssh_folder, &alias);
            Some(HostStanza {
                alias,
                hostname,
                identity_file,
            })
        })
        .collect();
    if stanzas.is_empty() {
        return;
    }

    match ssh::write_fragment(&settings.ssh_folder, &stanzas) {
        Ok(fragment) => match ssh::ensure_include(ssh_config, &fragment) {
            Ok(true) => notes.push(format!(
                "added include for {} to {}",
                fragment.display(),
                ssh_config.display()
            )),
            Ok(false) => {}
            Err(e) => notes.push(format!("could not update {}: {e}", ssh_config.display())),
        },
        Err(e) => notes.push(format!("could not write ssh fragment: {e}")),
    }
}

/// Key pair + agent load for one SSH-mode account.
fn ssh_preflight(manifest: &Manifest, account: &Account, issues: &mut Vec<String>) {
    let Some(settings) = manifest.global.credential_ssh.as_ref() else {
        issues.push("ssh strategy active but credential_ssh is missing".to_string());
        return;
    };
    let (Some(alias), Some(hostname), Some(key_type)) = (
        account.ssh_host.as_deref(),
        account.ssh_hostname.as_deref(),
        account.ssh_type.as_deref(),
    ) else {
        issues.push("ssh strategy active but ssh_host/ssh_hostname/ssh_type incomplete".to_string());
        return;
    };

    let comment = ssh::key_comment(hostname, &account.username, &account.url);
    match ssh::ensure_keypair(&settings.ssh_folder, alias, key_type, &comment) {
        Ok(key) => {
            if !ssh::load_into_agent(&key) {
                issues.push(format!("could not load {} into ssh agent", key.display()));
            }
        }
        Err(e) => issues.push(format!("key pair for '{alias}': {e}")),
    }
}

/// Credential-store pre-flight for one HTTPS-mode account.
fn gcm_preflight(account: &Account, probe: &dyn CredentialStoreProbe, issues: &mut Vec<String>) {
    let Some(base_url) = account.credential_base_url() else {
        issues.push(format!("cannot derive credential URL from '{}'", account.url));
        return;
    };
    match gcm::ensure_credential(&base_url, &account.username, probe) {
        Ok(_) => {}
        Err(e) => issues.push(format!("credential pre-flight for {base_url}: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Per-repository processing
// ---------------------------------------------------------------------------

fn process_repo(
    git: &Git,
    account: &Account,
    account_dir: &Path,
    repo: &RepoName,
    entry: &RepoEntry,
    strategy: CredentialType,
    opts: &SyncOptions,
) -> RepoReport {
    let dir = resolve_repo_dir(account_dir, repo, entry);
    let mut report = RepoReport {
        repo: repo.clone(),
        dir: dir.clone(),
        action: RepoAction::Existing,
        changes: Vec::new(),
        issues: Vec::new(),
    };

    if !dir.exists() {
        if opts.dry_run {
            report.action = RepoAction::WouldClone;
            return report;
        }
        let url = match clone_url(account, repo, strategy) {
            Some(url) => url,
            None => {
                report.action = RepoAction::CloneFailed {
                    message: "cannot construct clone URL".to_string(),
                };
                return report;
            }
        };
        tracing::info!("cloning {url} into {}", dir.display());
        if let Err(e) = git.clone_into(&url, &dir) {
            report.action = RepoAction::CloneFailed {
                message: e.to_string(),
            };
            return report;
        }
        report.action = RepoAction::Cloned;
    }

    converge(git, account, repo, entry, strategy, &dir, opts, &mut report);
    report
}

/// Clone URL per credential strategy; never stored in the repository config.
fn clone_url(account: &Account, repo: &RepoName, strategy: CredentialType) -> Option<String> {
    match strategy {
        CredentialType::Ssh => {
            let alias = account.ssh_host.as_deref()?;
            Some(ssh_clone_url(alias, account.owner_segment(), repo))
        }
        CredentialType::Gcm => https_clone_url(account, repo),
    }
}

/// Read-compare-write each declared setting. Under dry-run nothing is
/// written; the would-be change is still recorded.
#[allow(clippy::too_many_arguments)]
fn converge(
    git: &Git,
    account: &Account,
    repo: &RepoName,
    entry: &RepoEntry,
    strategy: CredentialType,
    dir: &Path,
    opts: &SyncOptions,
    report: &mut RepoReport,
) {
    let declared = remote_url(account, repo);
    for push in [false, true] {
        let label = if push { "push URL" } else { "fetch URL" };
        match git.remote_get_url(dir, "origin", push) {
            Ok(current) if current.as_deref() == Some(declared.as_str()) => {}
            Ok(_) => apply(git, opts, report, label, &declared, |git| {
                git.remote_set_url(dir, "origin", &declared, push)
            }),
            Err(e) => report.issues.push(format!("{label}: {e}")),
        }
    }

    let identity = [
        ("user.name", account.name_for(entry)),
        ("user.email", account.email_for(entry)),
    ];
    for (key, desired) in identity {
        let Some(desired) = desired.filter(|v| !v.is_empty()) else {
            continue;
        };
        set_config(git, dir, opts, report, key, desired);
    }

    if strategy == CredentialType::Gcm {
        let Some(base_url) = account.credential_base_url() else {
            report
                .issues
                .push(format!("cannot derive credential URL from '{}'", account.url));
            return;
        };
        set_config(
            git,
            dir,
            opts,
            report,
            &format!("credential.{base_url}.username"),
            &account.username,
        );
        if let Some(provider) = account.gcm_provider.as_deref() {
            set_config(
                git,
                dir,
                opts,
                report,
                &format!("credential.{base_url}.provider"),
                provider,
            );
        }
        if let Some(use_http_path) = account.gcm_use_http_path {
            set_config(
                git,
                dir,
                opts,
                report,
                &format!("credential.{base_url}.useHttpPath"),
                if use_http_path { "true" } else { "false" },
            );
        }
    }
}

/// Read-compare-write one `git config` key.
fn set_config(
    git: &Git,
    dir: &Path,
    opts: &SyncOptions,
    report: &mut RepoReport,
    key: &str,
    desired: &str,
) {
    match git.config_get(dir, key) {
        Ok(current) if current.as_deref() == Some(desired) => {}
        Ok(_) => apply(git, opts, report, key, desired, |git| {
            git.config_set(dir, key, desired)
        }),
        Err(e) => report.issues.push(format!("{key}: {e}")),
    }
}

fn apply(
    git: &Git,
    opts: &SyncOptions,
    report: &mut RepoReport,
    label: &str,
    value: &str,
    write: impl FnOnce(&Git) -> Result<(), repokit_git::GitError>,
) {
    if opts.dry_run {
        report.changes.push(format!("would set {label} = {value}"));
        return;
    }
    match write(git) {
        Ok(()) => report.changes.push(format!("set {label} = {value}")),
        Err(e) => report.issues.push(format!("{label}: {e}")),
    }
}
