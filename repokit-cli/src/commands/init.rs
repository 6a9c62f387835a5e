//! `repokit init` — scaffold a starter manifest.

use anyhow::{bail, Context, Result};
use clap::Args;

use repokit_core::manifest;

const STARTER: &str = r#"# repokit manifest. Edit to describe your accounts, then run `repokit sync`.
global:
  # Root of the checkout tree; created if absent.
  folder: ~/src
  # Enable exactly the strategies you use. SSH accounts additionally declare
  # ssh_host / ssh_hostname / ssh_type below.
  credential_ssh:
    enabled: false
    ssh_folder: ~/.ssh
  credential_gcm:
    enabled: true
    helper: manager
    credentialStore: secretservice

accounts:
  github-personal:
    url: https://github.com/your-user
    username: your-user
    folder: personal
    name: Your Name
    email: you@example.com
    repos:
      some-repo: {}
      another-repo:
        folder: experiments/another-repo
"#;

/// Arguments for `repokit init`.
#[derive(Args, Debug)]
pub struct InitArgs {}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = manifest::default_path().context("could not resolve manifest path")?;
        if path.exists() {
            bail!(
                "manifest already exists at {}; edit it directly",
                path.display()
            );
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        std::fs::write(&path, STARTER)
            .with_context(|| format!("cannot write {}", path.display()))?;

        println!("✓ Wrote starter manifest to {}", path.display());
        println!("  Edit it, then run `repokit sync`.");
        Ok(())
    }
}
