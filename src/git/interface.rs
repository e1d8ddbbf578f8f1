//! git::interface
//!
//! Commit snapshot access using git2.
//!
//! # Architecture
//!
//! The `Git` struct is the only type that talks to `git2`. It answers
//! questions about the tree recorded at a commit and never looks at the
//! index or the working directory; the worktree is a separate source
//! (see [`crate::worktree`]).
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: HEAD is unborn or a ref does not exist
//! - [`GitError::PathNotFound`]: The commit has no file at the path
//! - [`GitError::SymlinkLoop`]: Symlink resolution did not terminate
//! - [`GitError::Cancelled`]: The caller cancelled the request
//!
//! # Example
//!
//! ```ignore
//! use giterminism::core::cancel::Cancellation;
//! use giterminism::git::{Git, VersionControl};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head_commit()?;
//! let files = git.commit_file_path_list(&Cancellation::new(), &head)?;
//! println!("{} files at {}", files.len(), head.short(7));
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;
use tracing::debug;

use super::{VersionControl, MAX_SYMLINK_DEPTH};
use crate::core::cancel::{Cancellation, Cancelled};
use crate::core::paths;
use crate::core::types::{CommitId, TypeError};

const FILEMODE_TREE: i32 = 0o040000;
const FILEMODE_BLOB: i32 = 0o100644;
const FILEMODE_BLOB_EXECUTABLE: i32 = 0o100755;
const FILEMODE_LINK: i32 = 0o120000;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// The commit has no file at the requested path.
    #[error("path '{path}' not found at commit {commit}")]
    PathNotFound {
        /// Repository-relative path
        path: String,
        /// Commit that was searched
        commit: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The object that was not found
        oid: String,
    },

    /// Symlink resolution exceeded the depth limit.
    #[error("too many levels of symbolic links: {path}")]
    SymlinkLoop {
        /// The path being resolved
        path: String,
    },

    /// Invalid commit id format.
    #[error("invalid commit id: {message}")]
    InvalidCommitId {
        /// Description of the problem
        message: String,
    },

    /// The request was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch
                if context == "HEAD" || context.starts_with("refs/") =>
            {
                GitError::RefNotFound {
                    refname: context.to_string(),
                }
            }
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidCommitId {
                message: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<Cancelled> for GitError {
    fn from(_: Cancelled) -> Self {
        GitError::Cancelled
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidCommitId(message) => GitError::InvalidCommitId { message },
            other => GitError::Internal {
                message: other.to_string(),
            },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// Path to .git directory
    pub git_dir: PathBuf,
    /// Path to working directory
    pub work_dir: PathBuf,
}

/// Kind of a tree entry after classification by file mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

impl EntryKind {
    fn from_filemode(mode: i32) -> Self {
        match mode {
            FILEMODE_BLOB | FILEMODE_BLOB_EXECUTABLE => EntryKind::File,
            FILEMODE_TREE => EntryKind::Directory,
            FILEMODE_LINK => EntryKind::Symlink,
            _ => EntryKind::Other,
        }
    }
}

/// A tree entry found by path.
#[derive(Debug)]
struct ResolvedEntry {
    /// Path of the entry after symlink resolution
    path: String,
    id: git2::Oid,
    kind: EntryKind,
}

/// One pass of path resolution.
enum Step {
    Found(ResolvedEntry),
    Missing,
    Redirect(String),
}

/// The Git interface.
///
/// Wraps a `git2::Repository` behind a mutex so that a single instance
/// can serve concurrent resolver calls.
pub struct Git {
    /// The underlying git2 repository
    repo: Mutex<git2::Repository>,
    info: RepoInfo,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.info.git_dir)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        let git_dir = repo.path().to_path_buf();
        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(Self {
            repo: Mutex::new(repo),
            info: RepoInfo { git_dir, work_dir },
        })
    }

    /// Get repository information (git_dir and work_dir paths).
    pub fn info(&self) -> &RepoInfo {
        &self.info
    }

    /// Get the .git directory path.
    pub fn git_dir(&self) -> &Path {
        &self.info.git_dir
    }

    /// Get the working directory path.
    pub fn work_dir(&self) -> &Path {
        &self.info.work_dir
    }

    fn lock(&self) -> Result<MutexGuard<'_, git2::Repository>, GitError> {
        self.repo.lock().map_err(|_| GitError::Internal {
            message: "repository lock poisoned".to_string(),
        })
    }

    fn with_repo<T>(
        &self,
        f: impl FnOnce(&git2::Repository) -> Result<T, GitError>,
    ) -> Result<T, GitError> {
        let repo = self.lock()?;
        f(&repo)
    }
}

// =============================================================================
// Tree traversal
// =============================================================================

fn commit_tree<'r>(repo: &'r git2::Repository, commit: &CommitId) -> Result<git2::Tree<'r>, GitError> {
    let oid = git2::Oid::from_str(commit.as_str())
        .map_err(|e| GitError::from_git2(e, commit.as_str()))?;

    repo.find_commit(oid)
        .and_then(|c| c.tree())
        .map_err(|e| GitError::from_git2(e, commit.as_str()))
}

fn read_link_target(repo: &git2::Repository, id: git2::Oid) -> Result<String, GitError> {
    let blob = repo
        .find_blob(id)
        .map_err(|e| GitError::from_git2(e, &id.to_string()))?;
    Ok(String::from_utf8_lossy(blob.content()).into_owned())
}

/// Resolve `path` in the tree, following symlinks in intermediate
/// components and, if `follow_last` is set, in the last component.
fn resolve_entry(
    repo: &git2::Repository,
    root: &git2::Tree<'_>,
    path: &str,
    follow_last: bool,
    cancel: &Cancellation,
) -> Result<Option<ResolvedEntry>, GitError> {
    let mut current = paths::normalize(path);

    for _ in 0..=MAX_SYMLINK_DEPTH {
        cancel.check()?;

        if paths::escapes_root(&current) {
            return Ok(None);
        }

        if current.is_empty() {
            return Ok(Some(ResolvedEntry {
                path: current,
                id: root.id(),
                kind: EntryKind::Directory,
            }));
        }

        match step(repo, root, &current, follow_last)? {
            Step::Found(entry) => return Ok(Some(entry)),
            Step::Missing => return Ok(None),
            Step::Redirect(next) => {
                debug!(from = %current, to = %next, "following commit symlink");
                current = next;
            }
        }
    }

    Err(GitError::SymlinkLoop {
        path: path.to_string(),
    })
}

fn step(
    repo: &git2::Repository,
    root: &git2::Tree<'_>,
    path: &str,
    follow_last: bool,
) -> Result<Step, GitError> {
    let components: Vec<&str> = path.split('/').collect();
    let mut tree = repo
        .find_tree(root.id())
        .map_err(|e| GitError::from_git2(e, path))?;

    for (idx, name) in components.iter().enumerate() {
        let is_last = idx + 1 == components.len();

        let (id, kind) = match tree.get_name(name) {
            Some(entry) => (entry.id(), EntryKind::from_filemode(entry.filemode())),
            None => return Ok(Step::Missing),
        };

        if kind == EntryKind::Symlink && (!is_last || follow_last) {
            let target = read_link_target(repo, id)?;
            if target.starts_with('/') {
                return Ok(Step::Missing);
            }

            let link_dir = components[..idx].join("/");
            let rest = components[idx + 1..].join("/");
            let redirected = paths::join(&paths::join(&link_dir, &target), &rest);
            return Ok(Step::Redirect(redirected));
        }

        if is_last {
            return Ok(Step::Found(ResolvedEntry {
                path: path.to_string(),
                id,
                kind,
            }));
        }

        if kind != EntryKind::Directory {
            return Ok(Step::Missing);
        }

        tree = repo
            .find_tree(id)
            .map_err(|e| GitError::from_git2(e, path))?;
    }

    Ok(Step::Missing)
}

impl VersionControl for Git {
    /// Resolve HEAD to a commit.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn (new repository)
    fn head_commit(&self) -> Result<CommitId, GitError> {
        self.with_repo(|repo| {
            let head = repo.head().map_err(|e| GitError::from_git2(e, "HEAD"))?;
            let oid = head
                .peel_to_commit()
                .map_err(|e| GitError::from_git2(e, "HEAD"))?
                .id();

            CommitId::new(oid.to_string()).map_err(GitError::from)
        })
    }

    fn read_commit_file(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<Vec<u8>, GitError> {
        self.with_repo(|repo| {
            let tree = commit_tree(repo, commit)?;

            match resolve_entry(repo, &tree, path, true, cancel)? {
                Some(entry) if entry.kind == EntryKind::File => {
                    let blob = repo
                        .find_blob(entry.id)
                        .map_err(|e| GitError::from_git2(e, &entry.path))?;
                    Ok(blob.content().to_vec())
                }
                _ => Err(GitError::PathNotFound {
                    path: path.to_string(),
                    commit: commit.to_string(),
                }),
            }
        })
    }

    fn is_commit_file_exist(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<bool, GitError> {
        self.with_repo(|repo| {
            let tree = commit_tree(repo, commit)?;
            let entry = resolve_entry(repo, &tree, path, true, cancel)?;
            Ok(matches!(entry, Some(e) if e.kind == EntryKind::File))
        })
    }

    fn is_commit_directory_exist(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<bool, GitError> {
        self.with_repo(|repo| {
            let tree = commit_tree(repo, commit)?;
            let entry = resolve_entry(repo, &tree, path, true, cancel)?;
            Ok(matches!(entry, Some(e) if e.kind == EntryKind::Directory))
        })
    }

    fn commit_file_path_list(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
    ) -> Result<Vec<String>, GitError> {
        self.with_repo(|repo| {
            let tree = commit_tree(repo, commit)?;
            let mut files = Vec::new();

            let walked = tree.walk(git2::TreeWalkMode::PreOrder, |dir, entry| {
                if cancel.is_cancelled() {
                    return git2::TreeWalkResult::Abort;
                }

                if matches!(
                    EntryKind::from_filemode(entry.filemode()),
                    EntryKind::File | EntryKind::Symlink
                ) {
                    if let Some(name) = entry.name() {
                        files.push(format!("{}{}", dir, name));
                    }
                }

                git2::TreeWalkResult::Ok
            });

            cancel.check()?;
            walked.map_err(|e| GitError::from_git2(e, commit.as_str()))?;

            files.sort();
            debug!(commit = %commit.short(7), count = files.len(), "listed commit files");
            Ok(files)
        })
    }

    fn check_and_read_commit_symlink(
        &self,
        cancel: &Cancellation,
        commit: &CommitId,
        path: &str,
    ) -> Result<Option<String>, GitError> {
        self.with_repo(|repo| {
            let tree = commit_tree(repo, commit)?;

            let entry = match resolve_entry(repo, &tree, path, false, cancel)? {
                Some(entry) if entry.kind == EntryKind::Symlink => entry,
                _ => return Ok(None),
            };

            let target = read_link_target(repo, entry.id)?;
            if target.starts_with('/') {
                return Ok(Some(target));
            }

            Ok(Some(paths::join(paths::parent(&entry.path), &target)))
        })
    }
}
