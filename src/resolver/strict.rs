//! resolver::strict
//!
//! The commit snapshot is authoritative. The worktree is consulted for
//! allow-listed paths and for drift detection only.

use std::sync::Arc;

use tracing::debug;

use super::reconcile::{self, GlobStrategy, PolicyStrategy, Rerooted};
use super::{check_existence, compile_glob, strip_subtree_root, EntryKind, ResolvedFiles, Resolver, Sources};
use crate::core::cancel::Cancellation;
use crate::core::paths;
use crate::core::types::{Category, Mode};
use crate::errors::GiterminismError;
use crate::policy::Policy;

/// Resolver for giterminism mode.
#[derive(Debug, Clone)]
pub struct StrictResolver {
    sources: Sources,
    policy: Arc<Policy>,
}

impl StrictResolver {
    pub fn new(sources: Sources, policy: Arc<Policy>) -> Self {
        Self { sources, policy }
    }

    fn is_accepted(&self, category: Category, path: &str) -> Result<bool, GiterminismError> {
        Ok(self.policy.is_uncommitted_accepted(category, path)?)
    }
}

impl Resolver for StrictResolver {
    fn mode(&self) -> Mode {
        Mode::Strict
    }

    fn sources(&self) -> &Sources {
        &self.sources
    }

    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn read_configuration_file(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<Vec<u8>, GiterminismError> {
        let path = paths::normalize(path);

        if self.is_accepted(category, &path)? {
            debug!(%path, %category, source = "worktree", "reading accepted file");
            return self.sources.read_file(cancel, category, &path);
        }

        debug!(%path, %category, source = "commit", commit = %self.sources.commit().short(8), "reading committed file");
        self.sources.read_commit_file_checked(cancel, category, &path)
    }

    fn check_configuration_file_existence(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<(), GiterminismError> {
        let path = paths::normalize(path);
        let accepted = self.is_accepted(category, &path)?;
        check_existence(&self.sources, cancel, category, &path, EntryKind::File, accepted)
    }

    fn check_configuration_directory_existence(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<(), GiterminismError> {
        let path = paths::normalize(path);
        let accepted = self.is_accepted(category, &path)?;
        check_existence(&self.sources, cancel, category, &path, EntryKind::Directory, accepted)
    }

    fn is_configuration_file_exist(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<bool, GiterminismError> {
        let path = paths::normalize(path);
        if self.is_accepted(category, &path)? {
            self.sources.is_file_exist(cancel, &path)
        } else {
            self.sources.is_commit_file_exist(cancel, &path)
        }
    }

    fn is_configuration_directory_exist(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<bool, GiterminismError> {
        let path = paths::normalize(path);
        if self.is_accepted(category, &path)? {
            self.sources.is_directory_exist(cancel, &path)
        } else {
            self.sources.is_commit_directory_exist(cancel, &path)
        }
    }

    fn configuration_files_glob(
        &self,
        cancel: &Cancellation,
        pattern: &str,
        strategy: &dyn GlobStrategy,
    ) -> Result<ResolvedFiles, GiterminismError> {
        let glob = compile_glob(pattern)?;
        reconcile::reconcile_strict(&self.sources, cancel, &glob, strategy)
    }

    /// A `dir` recorded as a symlink at the commit is loaded from its
    /// target. Acceptance and error paths still use the paths under `dir`.
    /// A target outside the project directory yields an empty subtree.
    fn load_subtree(
        &self,
        cancel: &Cancellation,
        category: Category,
        dir: &str,
    ) -> Result<ResolvedFiles, GiterminismError> {
        let dir = paths::normalize(dir);
        let strategy = PolicyStrategy::new(&self.sources, &self.policy, category);

        match self.sources.commit_symlink_target(cancel, &dir)? {
            None => {
                let files = self.configuration_files_glob(cancel, &paths::subtree_pattern(&dir), &strategy)?;
                Ok(strip_subtree_root(files, &dir))
            }
            Some(Some(target)) => {
                debug!(%dir, %target, "subtree root is a symlink at the commit");
                let rerooted = Rerooted::new(&strategy, &dir, &target);
                let files = self.configuration_files_glob(cancel, &paths::subtree_pattern(&target), &rerooted)?;
                Ok(strip_subtree_root(files, &target))
            }
            Some(None) => {
                debug!(%dir, "subtree root points outside the project directory");
                Ok(ResolvedFiles::new())
            }
        }
    }
}
