//! git::mock
//!
//! In-memory commit snapshot for deterministic testing.
//!
//! # Design
//!
//! The mock repository stores a single commit as a map of file paths to
//! contents plus a map of symlink entries. Directories are implied by file
//! paths. Every commit read is recorded so tests can assert that a path
//! was not read twice.
//!
//! # Example
//!
//! ```
//! use giterminism::core::cancel::Cancellation;
//! use giterminism::git::mock::MockRepository;
//! use giterminism::git::VersionControl;
//!
//! let repo = MockRepository::new()
//!     .with_file("werf.yaml", "project: demo\n")
//!     .with_symlink("werf.yml", "werf.yaml");
//!
//! let cancel = Cancellation::new();
//! let head = repo.head_commit().unwrap();
//! assert_eq!(repo.read_commit_file(&cancel, &head, "werf.yml").unwrap(), b"project: demo\n");
//! assert_eq!(repo.reads(), vec!["werf.yml".to_string()]);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{GitError, VersionControl, MAX_SYMLINK_DEPTH};
use crate::core::cancel::Cancellation;
use crate::core::paths;
use crate::core::types::CommitId;

/// The commit id reported by [`MockRepository`] unless overridden.
pub const MOCK_HEAD: &str = "0123456789abcdef0123456789abcdef01234567";

/// Mock repository for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone)]
pub struct MockRepository {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockRepositoryInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockRepositoryInner {
    head: Option<CommitId>,
    files: BTreeMap<String, Vec<u8>>,
    /// Symlink path to raw target.
    symlinks: BTreeMap<String, String>,
    /// Paths passed to `read_commit_file`, in call order.
    reads: Vec<String>,
}

impl MockRepository {
    /// Create an empty commit.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockRepositoryInner {
                head: CommitId::new(MOCK_HEAD).ok(),
                files: BTreeMap::new(),
                symlinks: BTreeMap::new(),
                reads: Vec::new(),
            })),
        }
    }

    /// Add a committed file.
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .files
                .insert(paths::normalize(path), content.as_ref().to_vec());
        }
        self
    }

    /// Add a committed symlink entry.
    pub fn with_symlink(self, path: &str, target: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .symlinks
                .insert(paths::normalize(path), target.to_string());
        }
        self
    }

    /// Simulate a repository without commits.
    pub fn unborn(self) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.head = None;
        }
        self
    }

    /// Paths read through `read_commit_file`, in call order.
    pub fn reads(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.reads.clone()
    }

    /// Clear recorded reads.
    pub fn clear_reads(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.reads.clear();
    }

    fn check_commit(&self, commit: &CommitId) -> Result<(), GitError> {
        let inner = self.inner.lock().unwrap();
        match &inner.head {
            Some(head) if head == commit => Ok(()),
            _ => Err(GitError::ObjectNotFound {
                oid: commit.to_string(),
            }),
        }
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRepositoryInner {
    /// Resolve symlinks in every component of `path` (the last one only
    /// if `follow_last`). `None` means the path left the repository or
    /// resolution did not terminate.
    fn resolve(&self, path: &str, follow_last: bool) -> Option<String> {
        let mut current = paths::normalize(path);

        for _ in 0..=MAX_SYMLINK_DEPTH {
            if paths::escapes_root(&current) {
                return None;
            }

            let components: Vec<&str> = current.split('/').collect();
            let mut redirected = None;

            for idx in 0..components.len() {
                let is_last = idx + 1 == components.len();
                if is_last && !follow_last {
                    break;
                }

                let prefix = components[..=idx].join("/");
                if let Some(target) = self.symlinks.get(&prefix) {
                    if target.starts_with('/') {
                        return None;
                    }
                    let rest = components[idx + 1..].join("/");
                    let next = paths::join(&paths::join(paths::parent(&prefix), target), &rest);
                    redirected = Some(next);
                    break;
                }
            }

            match redirected {
                Some(next) => current = next,
                None => return Some(current),
            }
        }

        None
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty()
            || self
                .files
                .keys()
                .chain(self.symlinks.keys())
                .any(|file| file.len() > path.len() && paths::is_subpath(path, file))
    }
}

impl VersionControl for MockRepository {
    fn head_commit(&self) -> Result<CommitId, GitError> {
        let inner = self.inner.lock().unwrap();
        inner.head.clone().ok_or(GitError::RefNotFound {
            refname: "HEAD".to_string(),
        })
    }

    fn read_commit_file(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<Vec<u8>, GitError> {
        cancel.check()?;
        self.check_commit(commit)?;

        let mut inner = self.inner.lock().unwrap();
        inner.reads.push(paths::normalize(path));

        inner
            .resolve(path, true)
            .and_then(|resolved| inner.files.get(&resolved).cloned())
            .ok_or(GitError::PathNotFound {
                path: path.to_string(),
                commit: commit.to_string(),
            })
    }

    fn is_commit_file_exist(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<bool, GitError> {
        cancel.check()?;
        self.check_commit(commit)?;

        let inner = self.inner.lock().unwrap();
        Ok(inner
            .resolve(path, true)
            .is_some_and(|resolved| inner.files.contains_key(&resolved)))
    }

    fn is_commit_directory_exist(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<bool, GitError> {
        cancel.check()?;
        self.check_commit(commit)?;

        let inner = self.inner.lock().unwrap();
        Ok(inner
            .resolve(path, true)
            .is_some_and(|resolved| inner.is_dir(&resolved)))
    }

    fn commit_file_path_list(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
    ) -> Result<Vec<String>, GitError> {
        cancel.check()?;
        self.check_commit(commit)?;

        let inner = self.inner.lock().unwrap();
        let mut list: Vec<String> = inner
            .files
            .keys()
            .chain(inner.symlinks.keys())
            .cloned()
            .collect();
        list.sort();
        Ok(list)
    }

    fn check_and_read_commit_symlink(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<Option<String>, GitError> {
        cancel.check()?;
        self.check_commit(commit)?;

        let inner = self.inner.lock().unwrap();
        let Some(resolved) = inner.resolve(path, false) else {
            return Ok(None);
        };

        Ok(inner.symlinks.get(&resolved).map(|target| {
            if target.starts_with('/') {
                target.clone()
            } else {
                paths::join(paths::parent(&resolved), target)
            }
        }))
    }
}
