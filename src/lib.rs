//! giterminism - commit-first file resolution for reproducible builds
//!
//! Every configuration file a werf build reads (the werf config, its
//! templates, Dockerfiles, helm charts) is resolved against the head
//! commit. Files that are missing from the commit, or that differ from it,
//! are rejected unless the giterminism policy allows them. In loose mode
//! the project directory is read as is.
//!
//! # Architecture
//!
//! The crate is layered:
//!
//! - [`cli`] - Command-line interface layer (`gtm`)
//! - [`manager`] - Builds policy, resolver and inspector; exposes the file reader
//! - [`resolver`] - Strict and loose dual-source resolution
//! - [`inspector`] - Point checks for non-file dependencies
//! - [`policy`] - The giterminism policy document and its decisions
//! - [`git`] - Single interface to commit snapshots
//! - [`worktree`] - Single interface to the project directory
//! - [`core`] - Domain types, paths, configuration, cancellation
//! - [`errors`] - User-facing error taxonomy
//! - [`ui`] - CLI output utilities
//!
//! # Correctness Invariants
//!
//! 1. In strict mode returned bytes are the committed bytes, or worktree
//!    bytes for an allow-listed path
//! 2. In loose mode the worktree always wins and nothing is compared
//! 3. Neither the repository nor the project directory is ever modified

pub mod cli;
pub mod core;
pub mod errors;
pub mod git;
pub mod inspector;
pub mod manager;
pub mod policy;
pub mod resolver;
pub mod ui;
pub mod worktree;
