//! Blocking wrapper around the external `git` binary.
//!
//! Every invocation is scoped with `Command::current_dir`; the process-wide
//! working directory never changes, so an interrupt at any point leaves the
//! operator's shell where it started.
//!
//! Calls are synchronous and carry no timeout beyond what the underlying
//! network stack imposes.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::GitError;

/// Handle for the external `git` binary.
///
/// The default uses `git` from `PATH`; tests may point it at a stub via
/// [`Git::with_program`].
#[derive(Debug, Clone)]
pub struct Git {
    program: PathBuf,
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl Git {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }

    /// Use an explicit binary instead of `git` from `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, dir: Option<&Path>, args: I) -> Result<String, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let argv: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let pretty = argv
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        tracing::debug!("git {pretty}");

        let mut cmd = Command::new(&self.program);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd.args(&argv).output().map_err(|e| GitError::Spawn {
            program: self.program.display().to_string(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(GitError::Command {
                args: pretty,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string())
    }

    // -----------------------------------------------------------------------
    // Repository lifecycle
    // -----------------------------------------------------------------------

    /// `git clone <url> <dest>`.
    pub fn clone_into(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        self.run(
            None,
            [
                OsString::from("clone"),
                OsString::from(url),
                dest.as_os_str().to_owned(),
            ],
        )?;
        Ok(())
    }

    /// `git fetch --quiet origin`.
    pub fn fetch(&self, dir: &Path) -> Result<(), GitError> {
        self.run(Some(dir), ["fetch", "--quiet", "origin"])?;
        Ok(())
    }

    /// `git pull --ff-only --quiet` — advances the branch pointer only.
    pub fn pull_ff_only(&self, dir: &Path) -> Result<(), GitError> {
        self.run(Some(dir), ["pull", "--ff-only", "--quiet"])?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Branch and upstream queries
    // -----------------------------------------------------------------------

    /// Short name of the currently checked-out branch.
    pub fn current_branch(&self, dir: &Path) -> Result<String, GitError> {
        self.run(Some(dir), ["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Remote-tracking branch of HEAD, e.g. `origin/main`; `None` when the
    /// branch has no configured upstream.
    pub fn upstream(&self, dir: &Path) -> Result<Option<String>, GitError> {
        match self.run(
            Some(dir),
            ["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"],
        ) {
            Ok(name) => Ok(Some(name)),
            Err(GitError::Command { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// `git rev-list --count <range>`.
    pub fn count_range(&self, dir: &Path, range: &str) -> Result<u32, GitError> {
        let out = self.run(Some(dir), ["rev-list", "--count", range])?;
        out.trim().parse().map_err(|_| GitError::Parse {
            what: "commit count",
            output: out,
        })
    }

    /// Whether `name` resolves to a commit (e.g. `origin/main`).
    pub fn ref_exists(&self, dir: &Path, name: &str) -> Result<bool, GitError> {
        let spec = format!("{name}^{{commit}}");
        match self.run(Some(dir), ["rev-parse", "--verify", "--quiet", &spec]) {
            Ok(_) => Ok(true),
            Err(GitError::Command { .. }) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Committer timestamp (Unix seconds) of `rev`; `None` when the revision
    /// does not resolve.
    pub fn commit_unix_time(&self, dir: &Path, rev: &str) -> Result<Option<i64>, GitError> {
        let out = match self.run(Some(dir), ["log", "-1", "--format=%ct", rev]) {
            Ok(out) => out,
            Err(GitError::Command { .. }) => return Ok(None),
            Err(other) => return Err(other),
        };
        let first = out.lines().next().unwrap_or("").trim();
        if first.is_empty() {
            return Ok(None);
        }
        first
            .parse()
            .map(Some)
            .map_err(|_| GitError::Parse {
                what: "commit timestamp",
                output: out,
            })
    }

    // -----------------------------------------------------------------------
    // Working-tree state
    // -----------------------------------------------------------------------

    /// Number of stash entries.
    pub fn stash_count(&self, dir: &Path) -> Result<usize, GitError> {
        let out = self.run(Some(dir), ["stash", "list", "--format=%gd"])?;
        Ok(out.lines().filter(|l| !l.trim().is_empty()).count())
    }

    /// `git status --porcelain` parsed into counted signals.
    pub fn worktree_status(&self, dir: &Path) -> Result<WorktreeStatus, GitError> {
        let out = self.run(Some(dir), ["status", "--porcelain"])?;
        Ok(parse_porcelain(&out))
    }

    // -----------------------------------------------------------------------
    // Configuration convergence
    // -----------------------------------------------------------------------

    /// `git config <key> <value>` (repository-local scope).
    pub fn config_set(&self, dir: &Path, key: &str, value: &str) -> Result<(), GitError> {
        self.run(Some(dir), ["config", key, value])?;
        Ok(())
    }

    /// `git config --get <key>`; `None` when unset.
    pub fn config_get(&self, dir: &Path, key: &str) -> Result<Option<String>, GitError> {
        match self.run(Some(dir), ["config", "--get", key]) {
            Ok(value) => Ok(Some(value)),
            Err(GitError::Command { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// `git remote set-url [--push] <remote> <url>`.
    pub fn remote_set_url(
        &self,
        dir: &Path,
        remote: &str,
        url: &str,
        push: bool,
    ) -> Result<(), GitError> {
        let mut args = vec!["remote", "set-url"];
        if push {
            args.push("--push");
        }
        args.push(remote);
        args.push(url);
        self.run(Some(dir), args)?;
        Ok(())
    }

    /// `git remote get-url [--push] <remote>`; `None` when the remote is absent.
    pub fn remote_get_url(
        &self,
        dir: &Path,
        remote: &str,
        push: bool,
    ) -> Result<Option<String>, GitError> {
        let mut args = vec!["remote", "get-url"];
        if push {
            args.push("--push");
        }
        args.push(remote);
        match self.run(Some(dir), args) {
            Ok(url) => Ok(Some(url)),
            Err(GitError::Command { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Porcelain status parsing
// ---------------------------------------------------------------------------

/// Counted working-tree signals from `git status --porcelain`.
///
/// A single entry can contribute to more than one signal (a renamed file is
/// also staged); each signal independently marks the tree as not plain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Entries with an index-side change (`X` in `ADMC`).
    pub staged: usize,
    /// Entries with an unstaged change (`Y` in `MD`).
    pub modified: usize,
    /// `??` entries.
    pub untracked: usize,
    /// Entries with `R` on either side.
    pub renamed: usize,
}

impl WorktreeStatus {
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.modified == 0 && self.untracked == 0 && self.renamed == 0
    }
}

/// Parse `git status --porcelain` (v1) output into counts.
pub(crate) fn parse_porcelain(out: &str) -> WorktreeStatus {
    let mut status = WorktreeStatus::default();
    for line in out.lines() {
        let mut chars = line.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        if x == '?' && y == '?' {
            status.untracked += 1;
            continue;
        }
        if x == 'R' || y == 'R' {
            status.renamed += 1;
        }
        if matches!(x, 'A' | 'D' | 'M' | 'C') {
            status.staged += 1;
        }
        if matches!(y, 'M' | 'D') {
            status.modified += 1;
        }
    }
    status
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
