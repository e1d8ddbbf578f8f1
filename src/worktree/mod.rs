//! worktree
//!
//! Read-only access to the live project directory.
//!
//! All paths are relative to the project directory and normalized (see
//! [`crate::core::paths`]). A path whose real location is outside the
//! project directory is treated as absent.
//!
//! # Implementations
//!
//! - [`fs::FsWorktree`] - the real filesystem, via `walkdir`
//! - [`mock::MockWorktree`] - in-memory, for tests

pub mod fs;
pub mod mock;

pub use fs::FsWorktree;

use std::path::PathBuf;

use thiserror::Error;

use crate::core::cancel::{Cancellation, Cancelled};

/// Errors from worktree access.
#[derive(Debug, Error)]
pub enum WorktreeError {
    /// No file at the path.
    #[error("file '{path}' not found in the project directory")]
    NotFound {
        /// Project-relative path
        path: String,
    },

    /// The project directory itself is unusable.
    #[error("cannot open project directory '{path}': {source}")]
    InvalidRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem error while reading or walking.
    #[error("failed to access '{path}': {source}")]
    Io {
        /// Project-relative path
        path: String,
        source: std::io::Error,
    },

    /// Symlink cycle found while walking.
    #[error("symlink loop detected at '{path}'")]
    SymlinkLoop {
        /// Project-relative path
        path: String,
    },

    /// Malformed glob pattern.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The request was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl From<Cancelled> for WorktreeError {
    fn from(_: Cancelled) -> Self {
        WorktreeError::Cancelled
    }
}

/// The filesystem capabilities the resolver consumes.
pub trait Worktree: Send + Sync {
    /// Read a file, following symlinks.
    ///
    /// # Errors
    ///
    /// - [`WorktreeError::NotFound`] if there is no file at the path
    fn read_file(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, WorktreeError>;

    /// Whether a regular file exists at the path.
    fn is_file(&self, cancel: &Cancellation, path: &str) -> Result<bool, WorktreeError>;

    /// Whether a directory exists at the path.
    fn is_dir(&self, cancel: &Cancellation, path: &str) -> Result<bool, WorktreeError>;

    /// Every file matching the glob, sorted. Symlinked directories are
    /// descended into and reported under their unresolved path.
    fn glob(&self, cancel: &Cancellation, pattern: &str) -> Result<Vec<String>, WorktreeError>;
}
