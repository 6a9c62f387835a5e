//! # repokit-sync
//!
//! The repository reconciler: walks the declared account/repository tree and
//! makes the local checkout tree and each repository's configuration converge
//! to the manifest.
//!
//! Call [`reconcile`] with a validated manifest, a [`repokit_git::Git`]
//! handle, and a platform credential probe.

pub mod error;
pub mod paths;
pub mod reconciler;

pub use error::SyncError;
pub use reconciler::{
    reconcile, reconcile_at, AccountReport, RepoAction, RepoReport, SyncOptions, SyncReport,
};
