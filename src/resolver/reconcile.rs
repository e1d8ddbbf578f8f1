//! resolver::reconcile
//!
//! Glob reconciliation between the commit snapshot and the worktree.
//!
//! The per-path decisions are delegated to a [`GlobStrategy`]. The driver
//! owns the bookkeeping: which paths were already handled, which were
//! rejected, and in which order rejections are reported.
//!
//! A path that drifted from the commit is recorded in the *changed* set
//! and is never also reported as uncommitted. When both sets are
//! non-empty, only the changes are reported.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use super::{ResolvedFiles, Sources};
use crate::core::cancel::Cancellation;
use crate::core::paths::{self, GlobPattern};
use crate::core::types::Category;
use crate::errors::GiterminismError;
use crate::policy::Policy;

/// Per-path decisions for one glob call.
pub trait GlobStrategy {
    /// Category used in error messages.
    fn category(&self) -> Category;

    /// Whether the path may be read from the worktree.
    fn is_accepted(&self, path: &str) -> Result<bool, GiterminismError>;

    /// Read an accepted path from the worktree.
    fn read_accepted(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError>;

    /// Read a committed path, failing with
    /// [`GiterminismError::UncommittedFilesChanges`] on drift.
    fn read_committed(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError>;

    fn uncommitted_error(&self, paths: &BTreeSet<String>) -> GiterminismError {
        GiterminismError::uncommitted_files(self.category(), paths)
    }

    fn changed_error(&self, paths: &BTreeSet<String>) -> GiterminismError {
        GiterminismError::uncommitted_files_changes(self.category(), paths)
    }
}

/// The default strategy: acceptance from the policy, reads from the
/// sources.
#[derive(Debug, Clone, Copy)]
pub struct PolicyStrategy<'a> {
    sources: &'a Sources,
    policy: &'a Policy,
    category: Category,
}

impl<'a> PolicyStrategy<'a> {
    pub fn new(sources: &'a Sources, policy: &'a Policy, category: Category) -> Self {
        Self {
            sources,
            policy,
            category,
        }
    }
}

impl GlobStrategy for PolicyStrategy<'_> {
    fn category(&self) -> Category {
        self.category
    }

    fn is_accepted(&self, path: &str) -> Result<bool, GiterminismError> {
        Ok(self.policy.is_uncommitted_accepted(self.category, path)?)
    }

    fn read_accepted(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.sources.read_file(cancel, self.category, path)
    }

    fn read_committed(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.sources
            .read_commit_file_checked(cancel, self.category, path)
    }
}

/// Wraps a strategy so paths found under `target` are judged and reported
/// as if they were under `root`.
///
/// Used when `root` is a symlink to `target` at the commit. Reads still
/// go to the target paths.
pub struct Rerooted<'a> {
    inner: &'a dyn GlobStrategy,
    root: &'a str,
    target: &'a str,
}

impl<'a> Rerooted<'a> {
    pub fn new(inner: &'a dyn GlobStrategy, root: &'a str, target: &'a str) -> Self {
        Self { inner, root, target }
    }

    fn requested(&self, path: &str) -> String {
        match paths::strip_base(self.target, path) {
            Some(rel) => paths::join(self.root, &rel),
            None => path.to_string(),
        }
    }

    fn requested_all(&self, paths: &BTreeSet<String>) -> BTreeSet<String> {
        paths.iter().map(|path| self.requested(path)).collect()
    }
}

impl GlobStrategy for Rerooted<'_> {
    fn category(&self) -> Category {
        self.inner.category()
    }

    fn is_accepted(&self, path: &str) -> Result<bool, GiterminismError> {
        self.inner.is_accepted(&self.requested(path))
    }

    fn read_accepted(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.inner.read_accepted(cancel, path)
    }

    fn read_committed(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.inner.read_committed(cancel, path)
    }

    fn uncommitted_error(&self, paths: &BTreeSet<String>) -> GiterminismError {
        self.inner.uncommitted_error(&self.requested_all(paths))
    }

    fn changed_error(&self, paths: &BTreeSet<String>) -> GiterminismError {
        self.inner.changed_error(&self.requested_all(paths))
    }
}

/// Reconcile both sources for `glob`.
///
/// 1. Commit matches that are not accepted are read from the commit with
///    a drift check; drift is deferred
/// 2. Worktree matches not handled in step 1 are read if accepted,
///    otherwise deferred as uncommitted
/// 3. Deferred changes are reported first, then uncommitted paths
pub fn reconcile_strict(
    sources: &Sources,
    cancel: &Cancellation,
    glob: &GlobPattern,
    strategy: &dyn GlobStrategy,
) -> Result<ResolvedFiles, GiterminismError> {
    let mut files = ResolvedFiles::new();
    let mut processed: HashSet<String> = HashSet::new();
    let mut changed: BTreeSet<String> = BTreeSet::new();
    let mut uncommitted: BTreeSet<String> = BTreeSet::new();

    for path in sources.commit_glob(cancel, glob)? {
        cancel.check()?;

        if strategy.is_accepted(&path)? {
            continue;
        }

        processed.insert(path.clone());

        match strategy.read_committed(cancel, &path) {
            Ok(bytes) => {
                files.insert(path, bytes);
            }
            Err(GiterminismError::UncommittedFilesChanges { .. }) => {
                changed.insert(path);
            }
            Err(e) => return Err(e),
        }
    }

    for path in sources.worktree_glob(cancel, glob)? {
        cancel.check()?;

        if processed.contains(&path) {
            continue;
        }

        if strategy.is_accepted(&path)? {
            let bytes = strategy.read_accepted(cancel, &path)?;
            files.insert(path, bytes);
        } else {
            uncommitted.insert(path);
        }
    }

    debug!(
        pattern = glob.as_str(),
        category = %strategy.category(),
        resolved = files.len(),
        changed = changed.len(),
        uncommitted = uncommitted.len(),
        "strict glob reconciled"
    );

    if !changed.is_empty() {
        return Err(strategy.changed_error(&changed));
    }
    if !uncommitted.is_empty() {
        return Err(strategy.uncommitted_error(&uncommitted));
    }

    Ok(files)
}

/// Read every worktree match; the commit is not consulted.
pub fn reconcile_loose(
    sources: &Sources,
    cancel: &Cancellation,
    glob: &GlobPattern,
    strategy: &dyn GlobStrategy,
) -> Result<ResolvedFiles, GiterminismError> {
    let mut files = ResolvedFiles::new();

    for path in sources.worktree_glob(cancel, glob)? {
        cancel.check()?;
        let bytes = strategy.read_accepted(cancel, &path)?;
        files.insert(path, bytes);
    }

    debug!(pattern = glob.as_str(), resolved = files.len(), "loose glob read");
    Ok(files)
}
