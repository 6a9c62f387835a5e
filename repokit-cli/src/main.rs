//! Repokit — declarative Git workstation bootstrapper.
//!
//! # Usage
//!
//! ```text
//! repokit init
//! repokit sync [--config <path>] [--dry-run] [--verbose]
//! repokit status [root] [--pull] [--verbose] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "repokit",
    version,
    about = "Bring a local checkout tree in sync with a declared set of Git accounts",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scaffold a starter manifest at ~/.repokit/manifest.yaml.
    Init(InitArgs),

    /// Clone missing repositories and converge remotes, identity, and
    /// credential hints to the manifest.
    Sync(SyncArgs),

    /// Classify every checkout under a root against its upstream.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
