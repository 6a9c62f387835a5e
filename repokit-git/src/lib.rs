//! # repokit-git
//!
//! Narrow collaborator interface over the external `git` binary.
//!
//! The rest of the workspace never spawns `git` directly; everything goes
//! through [`Git`], which keeps each invocation scoped to an explicit
//! directory and surfaces failures as [`GitError`] with captured stderr.

pub mod client;
pub mod error;

pub use client::{Git, WorktreeStatus};
pub use error::GitError;
