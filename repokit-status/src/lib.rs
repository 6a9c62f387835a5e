//! # repokit-status
//!
//! Working-copy discovery and synchronization-state classification.
//!
//! Call [`scan`] with a directory root; it walks the tree, skips checkouts
//! nested inside other checkouts, and classifies each accepted repository
//! against its upstream, optionally fast-forwarding the cleanly-behind ones.

pub mod classify;
pub mod discover;
pub mod error;

pub use classify::{classify, scan, Outcome, RepoStatus, ScanOptions, Signals};
pub use discover::discover_repos;
pub use error::StatusError;
