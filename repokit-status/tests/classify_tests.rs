//! Classifier integration tests against real local repositories.
//!
//! Every scenario runs offline: "origins" are bare repositories on disk and
//! fetches go over the filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use repokit_git::Git;
use repokit_status::{classify, scan, Outcome, ScanOptions};
use tempfile::TempDir;

fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn sh_git(dir: &Path, args: &[&str]) {
    sh_git_dated(dir, args, None);
}

fn sh_git_dated(dir: &Path, args: &[&str], date: Option<&str>) {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    if let Some(date) = date {
        cmd.env("GIT_AUTHOR_DATE", date).env("GIT_COMMITTER_DATE", date);
    }
    let status = cmd.status().expect("spawn git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

fn commit_file(dir: &Path, file: &str, contents: &str, message: &str, date: Option<&str>) {
    fs::write(dir.join(file), contents).expect("write file");
    sh_git(dir, &["add", file]);
    sh_git_dated(
        dir,
        &[
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "commit",
            "-q",
            "-m",
            message,
        ],
        date,
    );
}

/// Bare origin (default branch `branch`) seeded with one commit, plus a clone.
fn origin_and_clone(root: &Path, branch: &str) -> (PathBuf, PathBuf) {
    let origin = root.join("origin.git");
    fs::create_dir_all(&origin).expect("mkdir");
    sh_git(&origin, &["init", "-q", "--bare", "-b", branch]);

    let seed = root.join("seed");
    fs::create_dir_all(&seed).expect("mkdir");
    sh_git(&seed, &["init", "-q", "-b", branch]);
    commit_file(&seed, "README.md", "seed\n", "initial", None);
    sh_git(&seed, &["remote", "add", "origin", origin.to_str().expect("utf8")]);
    sh_git(&seed, &["push", "-q", "-u", "origin", branch]);

    let clone = root.join("clone");
    sh_git(
        root,
        &["clone", "-q", origin.to_str().expect("utf8"), clone.to_str().expect("utf8")],
    );
    (origin, clone)
}

#[test]
fn fresh_clone_is_clean() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let (_, clone) = origin_and_clone(root.path(), "main");

    let status = classify(&Git::new(), clone, ScanOptions::default());
    assert_eq!(status.outcome, Outcome::Clean);
    let signals = status.signals.expect("signals");
    assert_eq!((signals.ahead, signals.behind), (0, 0));
}

#[test]
fn behind_upstream_needs_pull_then_pulls() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let (_, clone) = origin_and_clone(root.path(), "main");

    // Advance the origin from the seed checkout by three commits.
    let seed = root.path().join("seed");
    for i in 0..3 {
        commit_file(&seed, "a.txt", &format!("v{i}\n"), &format!("change {i}"), None);
    }
    sh_git(&seed, &["push", "-q", "origin", "main"]);

    let git = Git::new();
    let status = classify(&git, clone.clone(), ScanOptions::default());
    assert_eq!(status.outcome, Outcome::NeedsPull);
    assert_eq!(status.signals.expect("signals").behind, 3);

    let pulled = classify(&git, clone.clone(), ScanOptions { pull: true });
    assert_eq!(pulled.outcome, Outcome::Pulled);

    let after = classify(&git, clone, ScanOptions::default());
    assert_eq!(after.outcome, Outcome::Clean);
}

#[test]
fn unpushed_commits_require_review() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let (_, clone) = origin_and_clone(root.path(), "main");
    commit_file(&clone, "local.txt", "1\n", "local 1", None);
    commit_file(&clone, "local.txt", "2\n", "local 2", None);

    let status = classify(&Git::new(), clone, ScanOptions::default());
    assert_eq!(status.outcome, Outcome::RequiresReview);
    let signals = status.signals.expect("signals");
    assert_eq!(signals.ahead, 2);
    assert_eq!(signals.pending_push, 2);
    assert!(!signals.diverged);
}

#[test]
fn single_untracked_file_requires_review() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let (_, clone) = origin_and_clone(root.path(), "main");
    fs::write(clone.join("scratch.txt"), "wip\n").expect("write");

    let status = classify(&Git::new(), clone, ScanOptions::default());
    assert_eq!(status.outcome, Outcome::RequiresReview);
    assert_eq!(status.signals.expect("signals").untracked, 1);
}

#[test]
fn missing_upstream_is_an_error_row() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let lone = root.path().join("lone");
    fs::create_dir_all(&lone).expect("mkdir");
    sh_git(&lone, &["init", "-q", "-b", "main"]);
    commit_file(&lone, "a.txt", "a\n", "initial", None);
    // Dirty it up: the upstream check must fire before any other signal.
    fs::write(lone.join("untracked.txt"), "x\n").expect("write");

    let status = classify(&Git::new(), lone, ScanOptions::default());
    match status.outcome {
        Outcome::Error { reason } => assert!(reason.contains("no upstream")),
        other => panic!("expected error outcome, got {other:?}"),
    }
    assert!(status.signals.is_none(), "no further signals after the upstream check");
}

#[test]
fn stale_side_branch_is_clean_but_behind_main() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let origin = root.path().join("origin.git");
    fs::create_dir_all(&origin).expect("mkdir");
    sh_git(&origin, &["init", "-q", "--bare", "-b", "main"]);

    let work = root.path().join("work");
    fs::create_dir_all(&work).expect("mkdir");
    sh_git(&work, &["init", "-q", "-b", "main"]);
    commit_file(&work, "a.txt", "a\n", "old base", Some("2020-01-01T12:00:00 +0000"));
    sh_git(&work, &["remote", "add", "origin", origin.to_str().expect("utf8")]);
    sh_git(&work, &["push", "-q", "-u", "origin", "main"]);

    // Branch off at the old tip, then advance main past it.
    sh_git(&work, &["checkout", "-q", "-b", "feature"]);
    sh_git(&work, &["push", "-q", "-u", "origin", "feature"]);
    sh_git(&work, &["checkout", "-q", "main"]);
    commit_file(&work, "a.txt", "b\n", "newer main", Some("2024-06-01T12:00:00 +0000"));
    sh_git(&work, &["push", "-q", "origin", "main"]);
    sh_git(&work, &["checkout", "-q", "feature"]);

    let status = classify(&Git::new(), work, ScanOptions::default());
    assert_eq!(status.outcome, Outcome::CleanBehindMain);
}

#[test]
fn side_branch_without_main_line_falls_through_to_clean() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let (_, clone) = origin_and_clone(root.path(), "trunk");

    let status = classify(&Git::new(), clone, ScanOptions::default());
    assert_eq!(status.outcome, Outcome::Clean, "no origin/main or origin/master to compare");
}

#[test]
fn scan_classifies_each_accepted_repo_once() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let (_, clone) = origin_and_clone(root.path(), "main");
    // A vendored checkout inside the clone must not produce a second row.
    fs::create_dir_all(clone.join("vendor/dep/.git")).expect("mkdir");

    let rows = scan(&Git::new(), root.path(), ScanOptions::default()).expect("scan");
    let paths: Vec<_> = rows.iter().map(|r| r.path.clone()).collect();
    assert!(paths.contains(&clone));
    assert!(!paths.iter().any(|p| p.ends_with("vendor/dep")));
    // seed + clone, nothing else.
    assert_eq!(rows.len(), 2);
}
