//! Target-path and URL resolution for declared repositories.
//!
//! Pure functions; the reconciler composes these with the git collaborator.

use std::path::{Path, PathBuf};

use repokit_core::types::{Account, RepoEntry, RepoName};

/// Resolve a repository's target folder.
///
/// An explicit absolute override wins; an explicit relative override joins
/// under the account folder; the default is `<account_dir>/<repo_key>`.
pub fn resolve_repo_dir(account_dir: &Path, repo: &RepoName, entry: &RepoEntry) -> PathBuf {
    match &entry.folder {
        Some(folder) if folder.is_absolute() => folder.clone(),
        Some(folder) => account_dir.join(folder),
        None => account_dir.join(&repo.0),
    }
}

/// The plain declared remote URL for a repository.
///
/// This is what lands in the repository's fetch and push configuration;
/// it never embeds a username.
pub fn remote_url(account: &Account, repo: &RepoName) -> String {
    format!("{}/{}.git", account.url.trim_end_matches('/'), repo.0)
}

/// SSH clone URL: `<host_alias>:<owner>/<repo>.git`.
pub fn ssh_clone_url(host_alias: &str, owner: &str, repo: &RepoName) -> String {
    format!("{host_alias}:{owner}/{}.git", repo.0)
}

/// HTTPS clone URL: the remote base URL with the username embedded after the
/// scheme. `None` when the URL has no scheme (rejected by validation).
pub fn https_clone_url(account: &Account, repo: &RepoName) -> Option<String> {
    let (scheme, rest) = account.url.split_once("://")?;
    Some(format!(
        "{scheme}://{}@{}/{}.git",
        account.username,
        rest.trim_end_matches('/'),
        repo.0
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
