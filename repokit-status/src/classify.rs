//! Synchronization-state classification for a discovered working copy.
//!
//! Outcome precedence:
//! 1. `Error` (no upstream, or git itself failing in the checkout)
//! 2. `RequiresReview` (anything unpushed, diverged, or dirty)
//! 3. `NeedsPull` / `Pulled` (behind a healthy upstream)
//! 4. `CleanBehindMain` (side branch older than origin's main line)
//! 5. `Clean`

use std::path::{Path, PathBuf};

use repokit_git::{Git, GitError};

use crate::discover::discover_repos;
use crate::error::StatusError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for a status scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Fast-forward repositories that are cleanly behind their upstream.
    pub pull: bool,
}

/// Every intermediate signal collected for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signals {
    pub branch: String,
    pub upstream: String,
    /// Commits on HEAD not reachable from the upstream.
    pub ahead: u32,
    /// Commits on the upstream not reachable from HEAD.
    pub behind: u32,
    pub diverged: bool,
    /// Same count as `ahead`, surfaced under its own label for the operator.
    pub pending_push: u32,
    pub stashes: usize,
    pub staged: usize,
    pub untracked: usize,
    pub modified: usize,
    pub renamed: usize,
}

impl Signals {
    /// Nothing unpushed, nothing diverged, nothing dirty.
    pub fn is_safe(&self) -> bool {
        self.ahead == 0
            && !self.diverged
            && self.stashes == 0
            && self.staged == 0
            && self.untracked == 0
            && self.modified == 0
            && self.renamed == 0
            && self.pending_push == 0
    }

    /// The non-zero signals, labelled, for review output.
    pub fn flagged(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.diverged {
            flags.push(format!("diverged ({} ahead / {} behind)", self.ahead, self.behind));
        } else if self.ahead > 0 {
            flags.push(format!("{} commit(s) to push", self.pending_push));
        }
        for (label, count) in [
            ("stash entries", self.stashes),
            ("staged files", self.staged),
            ("untracked files", self.untracked),
            ("modified files", self.modified),
            ("renamed files", self.renamed),
        ] {
            if count > 0 {
                flags.push(format!("{count} {label}"));
            }
        }
        flags
    }
}

/// Classification outcome for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Fully synchronized, nothing to do.
    Clean,
    /// Clean, but the branch tip is older than origin's main line.
    CleanBehindMain,
    /// Cleanly behind the upstream; a fast-forward would catch it up.
    NeedsPull,
    /// Was cleanly behind and has been fast-forwarded this run.
    Pulled,
    /// Unpushed, diverged, or dirty; operator attention required.
    RequiresReview,
    /// No upstream configured, or git failed inside the checkout.
    Error { reason: String },
}

/// One classified repository.
#[derive(Debug, Clone)]
pub struct RepoStatus {
    pub path: PathBuf,
    pub outcome: Outcome,
    /// Present for every outcome except early [`Outcome::Error`].
    pub signals: Option<Signals>,
    /// Supplementary detail (a failed fast-forward, a swallowed fetch error).
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Discover and classify every working copy under `root`.
pub fn scan(git: &Git, root: &Path, opts: ScanOptions) -> Result<Vec<RepoStatus>, StatusError> {
    let repos = discover_repos(root)?;
    Ok(repos
        .into_iter()
        .map(|path| classify(git, path, opts))
        .collect())
}

/// Classify a single working copy.
pub fn classify(git: &Git, path: PathBuf, opts: ScanOptions) -> RepoStatus {
    match classify_inner(git, &path, opts) {
        Ok(status) => status,
        Err(e) => RepoStatus {
            path,
            outcome: Outcome::Error {
                reason: e.to_string(),
            },
            signals: None,
            note: None,
        },
    }
}

fn classify_inner(git: &Git, path: &Path, opts: ScanOptions) -> Result<RepoStatus, GitError> {
    let branch = git.current_branch(path)?;

    // Fail fast: without an upstream there is nothing to compare against.
    let Some(upstream) = git.upstream(path)? else {
        return Ok(RepoStatus {
            path: path.to_path_buf(),
            outcome: Outcome::Error {
                reason: format!("branch '{branch}' has no upstream"),
            },
            signals: None,
            note: None,
        });
    };

    // A failed fetch leaves a stale local view; classify what is known.
    let mut note = None;
    if let Err(e) = git.fetch(path) {
        tracing::debug!("fetch failed in {}: {e}", path.display());
        note = Some(format!("fetch failed: {e}"));
    }

    let ahead = git.count_range(path, "@{upstream}..HEAD")?;
    let behind = git.count_range(path, "HEAD..@{upstream}")?;
    let worktree = git.worktree_status(path)?;
    let stashes = git.stash_count(path)?;

    let signals = Signals {
        branch: branch.clone(),
        upstream,
        ahead,
        behind,
        diverged: ahead > 0 && behind > 0,
        pending_push: ahead,
        stashes,
        staged: worktree.staged,
        untracked: worktree.untracked,
        modified: worktree.modified,
        renamed: worktree.renamed,
    };

    if !signals.is_safe() {
        return Ok(RepoStatus {
            path: path.to_path_buf(),
            outcome: Outcome::RequiresReview,
            signals: Some(signals),
            note,
        });
    }

    if signals.behind == 0 {
        let outcome = if is_main_branch(&branch) {
            Outcome::Clean
        } else if behind_main_line(git, path)? {
            Outcome::CleanBehindMain
        } else {
            Outcome::Clean
        };
        return Ok(RepoStatus {
            path: path.to_path_buf(),
            outcome,
            signals: Some(signals),
            note,
        });
    }

    // Cleanly behind the upstream.
    if opts.pull {
        match git.pull_ff_only(path) {
            Ok(()) => {
                return Ok(RepoStatus {
                    path: path.to_path_buf(),
                    outcome: Outcome::Pulled,
                    signals: Some(signals),
                    note,
                })
            }
            Err(e) => note = Some(format!("fast-forward failed: {e}")),
        }
    }
    Ok(RepoStatus {
        path: path.to_path_buf(),
        outcome: Outcome::NeedsPull,
        signals: Some(signals),
        note,
    })
}

fn is_main_branch(branch: &str) -> bool {
    branch == "main" || branch == "master"
}

/// Whether the current branch tip is strictly older than the tip of
/// whichever of `origin/main` / `origin/master` exists. Absent both, the
/// comparison is skipped.
fn behind_main_line(git: &Git, path: &Path) -> Result<bool, GitError> {
    for candidate in ["origin/main", "origin/master"] {
        if !git.ref_exists(path, candidate)? {
            continue;
        }
        let (Some(tip), Some(main_tip)) = (
            git.commit_unix_time(path, "HEAD")?,
            git.commit_unix_time(path, candidate)?,
        ) else {
            return Ok(false);
        };
        return Ok(tip < main_tip);
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
