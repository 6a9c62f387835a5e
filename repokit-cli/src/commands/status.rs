//! `repokit status` — synchronization state of every checkout under a root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use repokit_git::Git;
use repokit_status::{scan, Outcome, RepoStatus, ScanOptions};

/// Arguments for `repokit status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory to scan (default: current directory).
    pub root: Option<PathBuf>,

    /// Fast-forward repositories that are cleanly behind their upstream.
    #[arg(long)]
    pub pull: bool,

    /// Surface every intermediate signal for every repository.
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let git = Git::new();
        let rows = scan(&git, &root, ScanOptions { pull: self.pull })
            .with_context(|| format!("scan failed under '{}'", root.display()))?;

        if self.json {
            print_json(&rows)?;
            return Ok(());
        }
        self.print_table(&rows);
        Ok(())
    }

    fn print_table(&self, rows: &[RepoStatus]) {
        let attention = rows
            .iter()
            .filter(|r| !matches!(r.outcome, Outcome::Clean | Outcome::Pulled))
            .count();
        println!(
            "Repokit v{} | {} repositories | {} need attention",
            env!("CARGO_PKG_VERSION"),
            rows.len(),
            attention,
        );

        if rows.is_empty() {
            println!("No repositories found.");
            return;
        }

        let separator = "■".repeat(67).bright_black().to_string();
        println!("{separator}");
        println!(
            "Indicators: {} CLEAN  {} BEHIND MAIN  {} NEEDS PULL  {} PULLED  {} REVIEW  {} ERROR",
            outcome_indicator(&Outcome::Clean),
            outcome_indicator(&Outcome::CleanBehindMain),
            outcome_indicator(&Outcome::NeedsPull),
            outcome_indicator(&Outcome::Pulled),
            outcome_indicator(&Outcome::RequiresReview),
            outcome_indicator(&Outcome::Error {
                reason: String::new(),
            }),
        );
        println!("{separator}");

        let table_rows: Vec<StatusTableRow> = rows
            .iter()
            .map(|row| StatusTableRow {
                repository: row.path.display().to_string(),
                state: outcome_label(&row.outcome).to_string(),
                detail: self.detail_for(row),
            })
            .collect();
        let mut table = Table::new(table_rows);
        table.with(Style::rounded());
        println!("{table}");

        if attention > 0 && !self.pull {
            println!("Run 'repokit status --pull' to fast-forward the clean ones.");
        }
    }

    /// Non-verbose surfaces detail only for non-CLEAN outcomes.
    fn detail_for(&self, row: &RepoStatus) -> String {
        let mut detail = if self.verbose {
            let mut parts = Vec::new();
            if let Some(signals) = &row.signals {
                parts.push(format!(
                    "{} ↔ {} · {}↑ {}↓",
                    signals.branch, signals.upstream, signals.ahead, signals.behind
                ));
                parts.push(format!(
                    "stash {} · staged {} · untracked {} · modified {} · renamed {}",
                    signals.stashes,
                    signals.staged,
                    signals.untracked,
                    signals.modified,
                    signals.renamed
                ));
            }
            if let Some(summary) = outcome_detail(row) {
                parts.push(summary);
            }
            parts.join(" | ")
        } else {
            outcome_detail(row).unwrap_or_default()
        };
        if let Some(note) = &row.note {
            if !detail.is_empty() {
                detail.push_str(" | ");
            }
            detail.push_str(note);
        }
        detail
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "state")]
    state: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Clean => "CLEAN",
        Outcome::CleanBehindMain => "BEHIND MAIN",
        Outcome::NeedsPull => "NEEDS PULL",
        Outcome::Pulled => "PULLED",
        Outcome::RequiresReview => "REVIEW",
        Outcome::Error { .. } => "ERROR",
    }
}

fn outcome_key(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Clean => "clean",
        Outcome::CleanBehindMain => "clean_behind_main",
        Outcome::NeedsPull => "needs_pull",
        Outcome::Pulled => "pulled",
        Outcome::RequiresReview => "requires_review",
        Outcome::Error { .. } => "error",
    }
}

fn outcome_indicator(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Clean => "■".green().bold().to_string(),
        Outcome::CleanBehindMain => "■".cyan().bold().to_string(),
        Outcome::NeedsPull => "■".yellow().bold().to_string(),
        Outcome::Pulled => "■".blue().bold().to_string(),
        Outcome::RequiresReview => "■".red().bold().to_string(),
        Outcome::Error { .. } => "■".magenta().bold().to_string(),
    }
}

fn outcome_detail(row: &RepoStatus) -> Option<String> {
    match &row.outcome {
        Outcome::Clean => None,
        Outcome::CleanBehindMain => Some("tip older than origin's main line".to_string()),
        Outcome::NeedsPull => {
            let behind = row.signals.as_ref().map(|s| s.behind).unwrap_or(0);
            Some(format!("{behind} commit(s) behind"))
        }
        Outcome::Pulled => {
            let behind = row.signals.as_ref().map(|s| s.behind).unwrap_or(0);
            Some(format!("fast-forwarded {behind} commit(s)"))
        }
        Outcome::RequiresReview => Some(
            row.signals
                .as_ref()
                .map(|s| s.flagged().join(", "))
                .unwrap_or_else(|| "review required".to_string()),
        ),
        Outcome::Error { reason } => Some(reason.clone()),
    }
}

// ---------------------------------------------------------------------------
// JSON rendering
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    repositories: Vec<RepoStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    repositories: usize,
    clean: usize,
    needs_pull: usize,
    pulled: usize,
    requires_review: usize,
    errors: usize,
}

#[derive(Serialize)]
struct RepoStatusJson {
    path: String,
    state: String,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ahead: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    behind: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

fn print_json(rows: &[RepoStatus]) -> Result<()> {
    let count = |want: fn(&Outcome) -> bool| rows.iter().filter(|r| want(&r.outcome)).count();
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            repositories: rows.len(),
            clean: count(|o| matches!(o, Outcome::Clean | Outcome::CleanBehindMain)),
            needs_pull: count(|o| matches!(o, Outcome::NeedsPull)),
            pulled: count(|o| matches!(o, Outcome::Pulled)),
            requires_review: count(|o| matches!(o, Outcome::RequiresReview)),
            errors: count(|o| matches!(o, Outcome::Error { .. })),
        },
        repositories: rows
            .iter()
            .map(|row| RepoStatusJson {
                path: row.path.display().to_string(),
                state: outcome_key(&row.outcome).to_string(),
                detail: outcome_detail(row).unwrap_or_default(),
                branch: row.signals.as_ref().map(|s| s.branch.clone()),
                ahead: row.signals.as_ref().map(|s| s.ahead),
                behind: row.signals.as_ref().map(|s| s.behind),
                note: row.note.clone(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}
