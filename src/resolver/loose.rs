//! resolver::loose
//!
//! The worktree is authoritative. Nothing is compared with the commit.

use std::sync::Arc;

use tracing::debug;

use super::reconcile::{self, GlobStrategy, PolicyStrategy};
use super::{check_existence, compile_glob, strip_subtree_root, EntryKind, ResolvedFiles, Resolver, Sources};
use crate::core::cancel::Cancellation;
use crate::core::paths;
use crate::core::types::{Category, Mode};
use crate::errors::GiterminismError;
use crate::policy::Policy;

/// Resolver for loose giterminism.
#[derive(Debug, Clone)]
pub struct LooseResolver {
    sources: Sources,
    policy: Arc<Policy>,
}

impl LooseResolver {
    pub fn new(sources: Sources, policy: Arc<Policy>) -> Self {
        Self { sources, policy }
    }
}

impl Resolver for LooseResolver {
    fn mode(&self) -> Mode {
        Mode::Loose
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
        debug!(%path, %category, source = "worktree", "reading file");
        self.sources.read_file(cancel, category, &path)
    }

    fn check_configuration_file_existence(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<(), GiterminismError> {
        check_existence(&self.sources, cancel, category, &paths::normalize(path), EntryKind::File, true)
    }

    fn check_configuration_directory_existence(
        &self,
        cancel: &Cancellation,
        category: Category,
        path: &str,
    ) -> Result<(), GiterminismError> {
        check_existence(
            &self.sources,
            cancel,
            category,
            &paths::normalize(path),
            EntryKind::Directory,
            true,
        )
    }

    fn is_configuration_file_exist(
        &self,
        cancel: &Cancellation,
        _category: Category,
        path: &str,
    ) -> Result<bool, GiterminismError> {
        self.sources.is_file_exist(cancel, &paths::normalize(path))
    }

    fn is_configuration_directory_exist(
        &self,
        cancel: &Cancellation,
        _category: Category,
        path: &str,
    ) -> Result<bool, GiterminismError> {
        self.sources.is_directory_exist(cancel, &paths::normalize(path))
    }

    /// Only the worktree counts; a file present only at the commit is absent.
    fn is_configuration_file_exist_anywhere(
        &self,
        cancel: &Cancellation,
        path: &str,
    ) -> Result<bool, GiterminismError> {
        self.sources.is_file_exist(cancel, &paths::normalize(path))
    }

    fn configuration_files_glob(
        &self,
        cancel: &Cancellation,
        pattern: &str,
        strategy: &dyn GlobStrategy,
    ) -> Result<ResolvedFiles, GiterminismError> {
        let glob = compile_glob(pattern)?;
        reconcile::reconcile_loose(&self.sources, cancel, &glob, strategy)
    }

    fn load_subtree(
        &self,
        cancel: &Cancellation,
        category: Category,
        dir: &str,
    ) -> Result<ResolvedFiles, GiterminismError> {
        let dir = paths::normalize(dir);
        let strategy = PolicyStrategy::new(&self.sources, &self.policy, category);
        let files = self.configuration_files_glob(cancel, &paths::subtree_pattern(&dir), &strategy)?;
        Ok(strip_subtree_root(files, &dir))
    }
}
