//! Integration tests driving the real `git` binary against tempdir repos.

use std::fs;
use std::path::Path;
use std::process::Command;

use repokit_git::Git;
use tempfile::TempDir;

fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn sh_git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("spawn git");
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

fn init_repo(dir: &Path) {
    sh_git(dir, &["init", "-q", "-b", "main"]);
    sh_git(dir, &["config", "user.name", "Test"]);
    sh_git(dir, &["config", "user.email", "test@example.com"]);
}

fn commit_file(dir: &Path, file: &str, contents: &str, message: &str) {
    fs::write(dir.join(file), contents).expect("write file");
    sh_git(dir, &["add", file]);
    sh_git(dir, &["commit", "-q", "-m", message]);
}

#[test]
fn branch_and_config_roundtrip() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tempdir");
    init_repo(tmp.path());
    commit_file(tmp.path(), "a.txt", "a\n", "initial");

    let git = Git::new();
    assert_eq!(git.current_branch(tmp.path()).expect("branch"), "main");

    git.config_set(tmp.path(), "user.email", "other@example.com")
        .expect("config set");
    assert_eq!(
        git.config_get(tmp.path(), "user.email").expect("config get"),
        Some("other@example.com".to_string())
    );
    assert_eq!(
        git.config_get(tmp.path(), "repokit.missing").expect("get"),
        None
    );
}

#[test]
fn remote_urls_are_set_for_fetch_and_push() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tempdir");
    init_repo(tmp.path());
    sh_git(tmp.path(), &["remote", "add", "origin", "https://example.com/a.git"]);

    let git = Git::new();
    git.remote_set_url(tmp.path(), "origin", "https://example.com/b.git", false)
        .expect("set fetch url");
    git.remote_set_url(tmp.path(), "origin", "https://example.com/b.git", true)
        .expect("set push url");

    assert_eq!(
        git.remote_get_url(tmp.path(), "origin", false).expect("get"),
        Some("https://example.com/b.git".to_string())
    );
    assert_eq!(
        git.remote_get_url(tmp.path(), "origin", true).expect("get"),
        Some("https://example.com/b.git".to_string())
    );
    assert_eq!(
        git.remote_get_url(tmp.path(), "nosuch", false).expect("get"),
        None
    );
}

#[test]
fn worktree_signals_on_a_dirty_tree() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let tmp = TempDir::new().expect("tempdir");
    init_repo(tmp.path());
    commit_file(tmp.path(), "tracked.txt", "v1\n", "initial");

    let git = Git::new();
    assert!(git.worktree_status(tmp.path()).expect("status").is_clean());
    assert_eq!(git.stash_count(tmp.path()).expect("stash"), 0);

    fs::write(tmp.path().join("tracked.txt"), "v2\n").expect("edit");
    fs::write(tmp.path().join("loose.txt"), "x\n").expect("new file");
    let status = git.worktree_status(tmp.path()).expect("status");
    assert_eq!(status.modified, 1);
    assert_eq!(status.untracked, 1);
    assert!(!status.is_clean());
}

#[test]
fn upstream_and_counts_against_a_local_origin() {
    if !have_git() {
        eprintln!("git not available; skipping");
        return;
    }
    let root = TempDir::new().expect("tempdir");
    let origin = root.path().join("origin.git");
    fs::create_dir_all(&origin).expect("mkdir");
    sh_git(&origin, &["init", "-q", "--bare", "-b", "main"]);

    let seed = root.path().join("seed");
    fs::create_dir_all(&seed).expect("mkdir");
    init_repo(&seed);
    commit_file(&seed, "a.txt", "a\n", "initial");
    sh_git(&seed, &["remote", "add", "origin", origin.to_str().expect("utf8")]);
    sh_git(&seed, &["push", "-q", "-u", "origin", "main"]);

    let git = Git::new();
    assert_eq!(git.upstream(&seed).expect("upstream"), Some("origin/main".to_string()));
    assert_eq!(git.count_range(&seed, "@{upstream}..HEAD").expect("ahead"), 0);

    commit_file(&seed, "b.txt", "b\n", "local only");
    assert_eq!(git.count_range(&seed, "@{upstream}..HEAD").expect("ahead"), 1);

    assert!(git.ref_exists(&seed, "origin/main").expect("ref"));
    assert!(!git.ref_exists(&seed, "origin/master").expect("ref"));
    assert!(git
        .commit_unix_time(&seed, "HEAD")
        .expect("timestamp")
        .is_some());
    assert!(git
        .commit_unix_time(&seed, "origin/nope")
        .expect("timestamp")
        .is_none());

    // A repo with no upstream reports None rather than an error.
    let lone = root.path().join("lone");
    fs::create_dir_all(&lone).expect("mkdir");
    init_repo(&lone);
    commit_file(&lone, "a.txt", "a\n", "initial");
    assert_eq!(git.upstream(&lone).expect("upstream"), None);
}
