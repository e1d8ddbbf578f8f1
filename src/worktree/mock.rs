//! worktree::mock
//!
//! In-memory project directory for deterministic testing.
//!
//! Directories are implied by file paths. Reads are recorded so tests can
//! check which paths were taken from the worktree.
//!
//! # Example
//!
//! ```
//! use giterminism::core::cancel::Cancellation;
//! use giterminism::worktree::mock::MockWorktree;
//! use giterminism::worktree::Worktree;
//!
//! let wt = MockWorktree::new()
//!     .with_file("templates/a.tmpl", "a")
//!     .with_file("templates/b.tmpl", "b");
//!
//! let cancel = Cancellation::new();
//! assert_eq!(wt.glob(&cancel, "templates/*.tmpl").unwrap().len(), 2);
//! assert!(wt.is_dir(&cancel, "templates").unwrap());
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{Worktree, WorktreeError};
use crate::core::cancel::Cancellation;
use crate::core::paths::{self, GlobPattern};

/// Mock worktree for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockWorktree {
    inner: Arc<Mutex<MockWorktreeInner>>,
}

#[derive(Debug, Default)]
struct MockWorktreeInner {
    files: BTreeMap<String, Vec<u8>>,
    /// Paths passed to `read_file`, in call order.
    reads: Vec<String>,
}

impl MockWorktree {
    /// Create an empty project directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file.
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.write(path, content);
        self
    }

    /// Create or overwrite a file in place.
    pub fn write(&self, path: &str, content: impl AsRef<[u8]>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .files
            .insert(paths::normalize(path), content.as_ref().to_vec());
    }

    /// Delete a file.
    pub fn remove(&self, path: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.files.remove(&paths::normalize(path));
    }

    /// Paths read through `read_file`, in call order.
    pub fn reads(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.reads.clone()
    }

    /// Clear recorded reads.
    pub fn clear_reads(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.reads.clear();
    }
}

impl Worktree for MockWorktree {
    fn read_file(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, WorktreeError> {
        cancel.check()?;

        let path = paths::normalize(path);
        let mut inner = self.inner.lock().unwrap();
        inner.reads.push(path.clone());

        inner
            .files
            .get(&path)
            .cloned()
            .ok_or(WorktreeError::NotFound { path })
    }

    fn is_file(&self, cancel: &Cancellation, path: &str) -> Result<bool, WorktreeError> {
        cancel.check()?;

        let inner = self.inner.lock().unwrap();
        Ok(inner.files.contains_key(&paths::normalize(path)))
    }

    fn is_dir(&self, cancel: &Cancellation, path: &str) -> Result<bool, WorktreeError> {
        cancel.check()?;

        let path = paths::normalize(path);
        let inner = self.inner.lock().unwrap();
        Ok(path.is_empty()
            || inner
                .files
                .keys()
                .any(|file| file.len() > path.len() && paths::is_subpath(&path, file)))
    }

    fn glob(&self, cancel: &Cancellation, pattern: &str) -> Result<Vec<String>, WorktreeError> {
        cancel.check()?;

        let glob = GlobPattern::new(pattern).map_err(|e| WorktreeError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let inner = self.inner.lock().unwrap();
        Ok(inner
            .files
            .keys()
            .filter(|file| glob.matches(file))
            .cloned()
            .collect())
    }
}
