//! git
//!
//! Read-only access to commit snapshots.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to the repository. The resolver asks
//! questions about a commit through the [`VersionControl`] contract and never
//! opens the repository itself. No other module imports `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Head commit resolution
//! - Reading files and probing files/directories at a commit
//! - Listing every file path recorded at a commit
//! - Symlink resolution as recorded at a commit
//!
//! # Invariants
//!
//! - All paths are repository-relative, forward-slash, normalized
//! - Nothing here mutates the repository
//! - Symlinks whose targets leave the repository resolve to "not found"
//!
//! # Example
//!
//! ```ignore
//! use giterminism::core::cancel::Cancellation;
//! use giterminism::git::{Git, VersionControl};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let cancel = Cancellation::new();
//!
//! let head = git.head_commit()?;
//! let bytes = git.read_commit_file(&cancel, &head, "werf.yaml")?;
//! ```

mod interface;
pub mod mock;

pub use interface::{Git, GitError, RepoInfo};

use crate::core::cancel::Cancellation;
use crate::core::types::CommitId;

/// Maximum number of symlinks followed while resolving a single path.
pub const MAX_SYMLINK_DEPTH: usize = 40;

/// The read-only repository capabilities the resolver consumes.
///
/// Implementations must be safe to share between threads; the resolver
/// may issue concurrent requests against one instance.
pub trait VersionControl: Send + Sync {
    /// The commit whose snapshot is in effect for this run.
    fn head_commit(&self) -> Result<CommitId, GitError>;

    /// Read a file at a commit, following symlinks.
    ///
    /// # Errors
    ///
    /// - [`GitError::PathNotFound`] if the path is absent or not a file
    /// - [`GitError::Cancelled`] if the request was cancelled
    fn read_commit_file(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<Vec<u8>, GitError>;

    /// Whether a file exists at a commit, following symlinks.
    fn is_commit_file_exist(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<bool, GitError>;

    /// Whether a directory exists at a commit, following symlinks.
    fn is_commit_directory_exist(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<bool, GitError>;

    /// Every file path recorded at a commit, sorted.
    ///
    /// Symlink entries are listed under their own path and are not expanded.
    fn commit_file_path_list(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
    ) -> Result<Vec<String>, GitError>;

    /// If `path` is a symlink at the commit, return its target resolved
    /// against the link's directory.
    fn check_and_read_commit_symlink(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<Option<String>, GitError>;
}
