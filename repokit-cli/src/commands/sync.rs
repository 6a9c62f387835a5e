//! `repokit sync` — reconcile the checkout tree with the manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use repokit_core::manifest;
use repokit_git::Git;
use repokit_sync::{reconcile, RepoAction, RepoReport, SyncOptions, SyncReport};

/// Arguments for `repokit sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Manifest path (default: ~/.repokit/manifest.yaml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show what would be cloned or changed without touching anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Also list repositories that were already at the declared state, and
    /// every individual setting applied.
    #[arg(long, short)]
    pub verbose: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let manifest = match &self.config {
            Some(path) => manifest::load_at(path),
            None => manifest::load(),
        }
        .context("manifest validation failed")?;

        let git = Git::new();
        let probe = repokit_auth::probe::detect();
        let opts = SyncOptions {
            dry_run: self.dry_run,
        };
        let report = reconcile(&manifest, &git, probe.as_ref(), &opts)
            .context("could not create the checkout tree")?;

        self.render(&report);
        Ok(())
    }

    fn render(&self, report: &SyncReport) {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        for note in &report.notes {
            println!("{prefix}{note}");
        }

        let mut cloned = 0usize;
        let mut updated = 0usize;
        let mut settled = 0usize;
        let mut failed = 0usize;

        for account in &report.accounts {
            println!("{prefix}{}", account.account.to_string().to_uppercase().bold());
            for issue in &account.preflight {
                println!("  {} {}", "!".yellow().bold(), issue);
            }
            for repo in &account.repos {
                match &repo.action {
                    RepoAction::Cloned => {
                        cloned += 1;
                        println!("  {} cloned {} → {}", "✓".green(), repo.repo, repo.dir.display());
                        self.print_detail(repo);
                    }
                    RepoAction::WouldClone => {
                        cloned += 1;
                        println!("  {} would clone {} → {}", "~".cyan(), repo.repo, repo.dir.display());
                    }
                    RepoAction::CloneFailed { message } => {
                        failed += 1;
                        println!("  {} {} clone failed: {}", "✗".red().bold(), repo.repo, message);
                    }
                    RepoAction::Existing if repo.changes.is_empty() && repo.issues.is_empty() => {
                        settled += 1;
                        if self.verbose {
                            println!("  · {} up to date", repo.repo);
                        }
                    }
                    RepoAction::Existing => {
                        updated += 1;
                        println!(
                            "  {} {} ({} setting(s))",
                            "✎".yellow(),
                            repo.repo,
                            repo.changes.len()
                        );
                        self.print_detail(repo);
                    }
                }
            }
        }

        println!(
            "{prefix}{} account(s): {} cloned, {} updated, {} up to date, {} failed",
            report.accounts.len(),
            cloned,
            updated,
            settled,
            failed
        );
    }

    fn print_detail(&self, repo: &RepoReport) {
        if self.verbose {
            for change in &repo.changes {
                println!("      {change}");
            }
        }
        for issue in &repo.issues {
            println!("      {} {}", "!".red(), issue);
        }
    }
}
