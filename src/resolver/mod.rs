//! resolver
//!
//! Dual-source file resolution: commit snapshot versus project directory.
//!
//! # Architecture
//!
//! A [`Resolver`] answers file requests for a [`Category`] of configuration.
//! There are two implementations, selected once when the manager is built:
//!
//! - [`StrictResolver`] - the commit wins; worktree content is used only
//!   for allow-listed paths, and any drift is an error
//! - [`LooseResolver`] - the worktree wins; no comparison is performed
//!
//! Both read through [`Sources`], which pairs the commit snapshot with the
//! worktree and translates between project-relative and
//! repository-relative paths.
//!
//! # Invariants
//!
//! - Strict reads return commit bytes, or worktree bytes for an allow-listed
//!   path, and nothing else
//! - Content equal up to `\r\n` vs `\n` is not drift
//! - Resolvers hold no mutable state; every call allocates its own sets
//!
//! # Example
//!
//! ```ignore
//! let cancel = Cancellation::new();
//! let bytes = resolver.read_configuration_file(&cancel, Category::Dockerfile, "Dockerfile")?;
//! let templates = resolver.files_glob(&cancel, Category::ConfigTemplate, ".werf/**/*.tmpl")?;
//! ```

pub mod loose;
pub mod reconcile;
pub mod strict;

pub use loose::LooseResolver;
pub use reconcile::{GlobStrategy, PolicyStrategy};
pub use strict::StrictResolver;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::core::cancel::Cancellation;
use crate::core::paths::{self, GlobPattern};
use crate::core::types::{Category, CommitId, Mode};
use crate::errors::GiterminismError;
use crate::git::{GitError, VersionControl};
use crate::policy::Policy;
use crate::worktree::{Worktree, WorktreeError};

/// Resolved files keyed by project-relative path.
pub type ResolvedFiles = BTreeMap<String, Vec<u8>>;

/// Where the project directory sits inside the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Project directory relative to the repository root (`""` for the root)
    repo_rel_dir: String,
}

impl ProjectLayout {
    /// A project at the repository root.
    pub fn root() -> Self {
        Self::default()
    }

    /// A project in a subdirectory of the repository.
    pub fn subdir(repo_rel_dir: &str) -> Self {
        Self {
            repo_rel_dir: paths::normalize(repo_rel_dir),
        }
    }

    pub fn repo_rel_dir(&self) -> &str {
        &self.repo_rel_dir
    }

    /// Project-relative path to repository-relative path.
    pub fn to_repo(&self, path: &str) -> String {
        paths::join(&self.repo_rel_dir, path)
    }

    /// Repository-relative path to project-relative path, if inside the
    /// project directory.
    pub fn to_project(&self, repo_path: &str) -> Option<String> {
        paths::strip_base(&self.repo_rel_dir, &paths::normalize(repo_path))
    }
}

/// The two file sources a resolver reconciles.
///
/// Every method takes and returns project-relative paths.
#[derive(Clone)]
pub struct Sources {
    repo: Arc<dyn VersionControl>,
    worktree: Arc<dyn Worktree>,
    commit: CommitId,
    layout: ProjectLayout,
}

impl std::fmt::Debug for Sources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources")
            .field("commit", &self.commit)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Sources {
    pub fn new(
        repo: Arc<dyn VersionControl>,
        worktree: Arc<dyn Worktree>,
        commit: CommitId,
        layout: ProjectLayout,
    ) -> Self {
        Self {
            repo,
            worktree,
            commit,
            layout,
        }
    }

    /// The commit whose snapshot is read.
    pub fn commit(&self) -> &CommitId {
        &self.commit
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    // =========================================================================
    // Commit snapshot
    // =========================================================================

    pub fn is_commit_file_exist(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        Ok(self
            .repo
            .is_commit_file_exist(cancel, &self.commit, &self.layout.to_repo(path))?)
    }

    pub fn is_commit_directory_exist(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        Ok(self
            .repo
            .is_commit_directory_exist(cancel, &self.commit, &self.layout.to_repo(path))?)
    }

    /// Read a file from the commit.
    ///
    /// A missing file is [`GiterminismError::FilesNotFoundInProjectGitRepository`].
    pub fn read_commit_file(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<Vec<u8>, GiterminismError> {
        match self
            .repo
            .read_commit_file(cancel, &self.commit, &self.layout.to_repo(path))
        {
            Ok(bytes) => Ok(bytes),
            Err(GitError::PathNotFound { .. }) => Err(
                GiterminismError::files_not_found_in_project_git_repository(category, [path]),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Read a file from the commit, failing if the worktree copy differs.
    ///
    /// A worktree copy that is missing is not drift.
    pub fn read_commit_file_checked(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<Vec<u8>, GiterminismError> {
        let committed = self.read_commit_file(cancel, category, path)?;

        if self.is_file_exist(cancel, path)? {
            let local = self.read_file(cancel, category, path)?;
            if !is_same_content(&committed, &local) {
                debug!(%path, %category, "worktree content differs from commit");
                return Err(GiterminismError::uncommitted_files_changes(category, [path]));
            }
        }

        Ok(committed)
    }

    /// Commit files matching the glob, sorted.
    pub fn commit_glob(&self, cancel: &Cancellation, glob: &GlobPattern) -> Result<Vec<String>, GiterminismError> {
        let list = self.repo.commit_file_path_list(cancel, &self.commit)?;

        Ok(list
            .iter()
            .filter_map(|repo_path| self.layout.to_project(repo_path))
            .filter(|path| !path.is_empty() && glob.matches(path))
            .collect())
    }

    /// Target of a symlink recorded at the commit, if `path` is one.
    ///
    /// Returns `Some(None)` for a symlink whose target is outside the
    /// project directory.
    pub fn commit_symlink_target(
        &self,
        cancel: &Cancellation,
        path: &str,
    ) -> Result<Option<Option<String>>, GiterminismError> {
        let target = self
            .repo
            .check_and_read_commit_symlink(cancel, &self.commit, &self.layout.to_repo(path))?;

        Ok(target.map(|repo_target| {
            if repo_target.starts_with('/') || paths::escapes_root(&repo_target) {
                None
            } else {
                self.layout.to_project(&repo_target)
            }
        }))
    }

    /// Whether the path exists in the commit or the worktree.
    pub fn is_file_exist_anywhere(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        if self.is_commit_file_exist(cancel, path)? {
            return Ok(true);
        }
        self.is_file_exist(cancel, path)
    }

    // =========================================================================
    // Worktree
    // =========================================================================

    pub fn is_file_exist(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        Ok(self.worktree.is_file(cancel, path)?)
    }

    pub fn is_directory_exist(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        Ok(self.worktree.is_dir(cancel, path)?)
    }

    /// Read a file from the worktree.
    ///
    /// A missing file is [`GiterminismError::FilesNotFoundInProjectDirectory`].
    pub fn read_file(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<Vec<u8>, GiterminismError> {
        match self.worktree.read_file(cancel, path) {
            Ok(bytes) => Ok(bytes),
            Err(WorktreeError::NotFound { .. }) => Err(
                GiterminismError::files_not_found_in_project_directory(category, [path]),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Worktree files matching the glob, sorted.
    pub fn worktree_glob(&self, cancel: &Cancellation, glob: &GlobPattern) -> Result<Vec<String>, GiterminismError> {
        Ok(self.worktree.glob(cancel, glob.as_str())?)
    }
}

/// Byte equality, tolerating `\r\n` line endings on the worktree side.
pub fn is_same_content(committed: &[u8], local: &[u8]) -> bool {
    committed == local || committed == normalize_line_endings(local).as_ref()
}

fn normalize_line_endings(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.windows(2).any(|w| w == b"\r\n") {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter().peekable();
    while let Some(&byte) = iter.next() {
        if byte == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(byte);
    }
    Cow::Owned(out)
}

pub(crate) fn compile_glob(pattern: &str) -> Result<GlobPattern, GiterminismError> {
    GlobPattern::new(pattern).map_err(|e| GiterminismError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Which kind of entry an existence check looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    File,
    Directory,
}

/// Existence check shared by both resolvers.
///
/// With `read_from_worktree` unset, presence at the commit is enough.
/// Otherwise, or if the commit lacks the entry, the worktree decides: a
/// worktree-only entry that may not be read from the worktree is
/// uncommitted.
pub(crate) fn check_existence(
    sources: &Sources,
    cancel: &Cancellation,
    category: Category,
    path: &str,
    kind: EntryKind,
    read_from_worktree: bool,
) -> Result<(), GiterminismError> {
    if !read_from_worktree {
        let in_commit = match kind {
            EntryKind::File => sources.is_commit_file_exist(cancel, path)?,
            EntryKind::Directory => sources.is_commit_directory_exist(cancel, path)?,
        };
        if in_commit {
            return Ok(());
        }
    }

    let in_worktree = match kind {
        EntryKind::File => sources.is_file_exist(cancel, path)?,
        EntryKind::Directory => sources.is_directory_exist(cancel, path)?,
    };

    match (in_worktree, read_from_worktree) {
        (true, true) => Ok(()),
        (true, false) => Err(GiterminismError::uncommitted_files(category, [path])),
        (false, true) => Err(GiterminismError::files_not_found_in_project_directory(category, [path])),
        (false, false) => Err(GiterminismError::files_not_found_in_project_git_repository(category, [path])),
    }
}

/// Contract shared by the strict and loose resolvers.
///
/// Paths are project-relative; they are normalized on entry.
pub trait Resolver: Send + Sync {
    /// The regime this resolver implements.
    fn mode(&self) -> Mode;

    /// The sources this resolver reads.
    fn sources(&self) -> &Sources;

    /// The policy this resolver consults.
    fn policy(&self) -> &Policy;

    /// Read a single configuration file.
    fn read_configuration_file(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<Vec<u8>, GiterminismError>;

    /// Fail unless the file may be read.
    fn check_configuration_file_existence(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<(), GiterminismError>;

    /// Fail unless the directory may be read.
    fn check_configuration_directory_existence(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<(), GiterminismError>;

    /// Whether the file exists in the source this resolver would read.
    fn is_configuration_file_exist(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<bool, GiterminismError>;

    /// Whether the directory exists in the source this resolver would read.
    fn is_configuration_directory_exist(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<bool, GiterminismError>;

    /// Resolve every file matching `pattern`, reconciling both sources with
    /// the given strategy.
    fn configuration_files_glob(
        &self,
        cancel: &Cancellation,
        pattern: &str,
        strategy: &dyn GlobStrategy,
    ) -> Result<ResolvedFiles, GiterminismError>;

    /// Resolve every file below `dir`, following a symlinked `dir` as
    /// recorded at the commit. Keys are relative to `dir`.
    fn load_subtree(
        &self,
        cancel: &Cancellation,
        category: Category,
        dir: &str,
    ) -> Result<ResolvedFiles, GiterminismError>;

    /// Whether the file exists in any source this resolver reads from,
    /// regardless of policy.
    fn is_configuration_file_exist_anywhere(
        &self,
        cancel: &Cancellation,
        path: &str,
    ) -> Result<bool, GiterminismError> {
        self.sources()
            .is_file_exist_anywhere(cancel, &paths::normalize(path))
    }

    /// [`Resolver::configuration_files_glob`] with the policy-driven
    /// strategy for `category`.
    fn files_glob(
        &self,
        cancel: &Cancellation,
        category: Category,
        pattern: &str,
    ) -> Result<ResolvedFiles, GiterminismError> {
        let strategy = PolicyStrategy::new(self.sources(), self.policy(), category);
        self.configuration_files_glob(cancel, pattern, &strategy)
    }
}

/// Build the resolver for a regime.
pub fn build(mode: Mode, sources: Sources, policy: Arc<Policy>) -> Box<dyn Resolver> {
    match mode {
        Mode::Strict => Box::new(StrictResolver::new(sources, policy)),
        Mode::Loose => Box::new(LooseResolver::new(sources, policy)),
    }
}

/// Re-key files found under `root` so they are relative to `root`.
pub(crate) fn strip_subtree_root(files: ResolvedFiles, root: &str) -> ResolvedFiles {
    files
        .into_iter()
        .filter_map(|(path, bytes)| {
            paths::strip_base(root, &path)
                .filter(|rel| !rel.is_empty())
                .map(|rel| (rel, bytes))
        })
        .collect()
}
