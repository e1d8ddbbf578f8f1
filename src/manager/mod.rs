//! manager
//!
//! Entry point for every configuration read.
//!
//! # Architecture
//!
//! A [`Manager`] is built once per process. It resolves the head commit,
//! loads the policy document through a bootstrap resolver, and then builds
//! the resolver and inspector that all later requests go through.
//!
//! ```text
//! Manager::open
//!   -> Git::open, FsWorktree::new, ProjectLayout
//!   -> head_commit
//!   -> bootstrap resolver (deny-all) reads werf-giterminism.yaml
//!   -> Policy -> Resolver + Inspector
//! ```
//!
//! The manager is immutable after construction and can be shared between
//! threads.
//!
//! # Example
//!
//! ```ignore
//! let cancel = Cancellation::new();
//! let manager = Manager::open(&cancel, Path::new("."), ManagerOptions::default())?;
//! let (path, bytes) = manager.file_reader().read_config(&cancel, "")?;
//! ```

pub mod file_reader;

pub use file_reader::FileReader;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::core::cancel::Cancellation;
use crate::core::config::{Config, DEFAULT_CHART_DIR, DEFAULT_POLICY_FILE, DEFAULT_TEMPLATES_DIR};
use crate::core::paths;
use crate::core::types::{Category, CommitId, Mode};
use crate::errors::GiterminismError;
use crate::git::{Git, GitError, VersionControl};
use crate::inspector::Inspector;
use crate::policy::Policy;
use crate::resolver::{self, ProjectLayout, Resolver, Sources};
use crate::worktree::{FsWorktree, Worktree, WorktreeError};

/// Errors from building a manager.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Worktree(#[from] WorktreeError),

    /// The project directory is not inside the repository worktree.
    #[error("project directory '{project_dir}' is outside the git worktree '{work_dir}'")]
    OutsideRepository { project_dir: PathBuf, work_dir: PathBuf },

    /// The policy document could not be loaded.
    #[error("unable to load giterminism config: {0}")]
    Policy(#[source] GiterminismError),
}

/// Settings fixed for the lifetime of a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerOptions {
    pub mode: Mode,
    /// Project-relative path of the policy document
    pub policy_file: String,
    /// Custom werf config path (`""` for the default names)
    pub config_path: String,
    pub templates_dir: String,
    pub chart_dir: String,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            policy_file: DEFAULT_POLICY_FILE.to_string(),
            config_path: String::new(),
            templates_dir: DEFAULT_TEMPLATES_DIR.to_string(),
            chart_dir: DEFAULT_CHART_DIR.to_string(),
        }
    }
}

impl ManagerOptions {
    /// Options with values from the layered tool configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.mode(),
            policy_file: config.policy_file().to_string(),
            config_path: config.config_path().to_string(),
            templates_dir: config.templates_dir().to_string(),
            chart_dir: config.chart_dir().to_string(),
        }
    }
}

/// The giterminism manager.
pub struct Manager {
    project_dir: PathBuf,
    head_commit: CommitId,
    options: ManagerOptions,
    policy: Arc<Policy>,
    resolver: Box<dyn Resolver>,
    inspector: Inspector,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("project_dir", &self.project_dir)
            .field("head_commit", &self.head_commit)
            .field("mode", &self.options.mode)
            .finish()
    }
}

impl Manager {
    /// Open the project at `project_dir` with the real repository and
    /// filesystem.
    pub fn open(cancel: &Cancellation, project_dir: &Path, options: ManagerOptions) -> Result<Self, ManagerError> {
        let git = Git::open(project_dir)?;
        Self::from_git(cancel, git, project_dir, options)
    }

    /// Like [`Manager::open`], with an already opened repository.
    pub fn from_git(
        cancel: &Cancellation,
        git: Git,
        project_dir: &Path,
        options: ManagerOptions,
    ) -> Result<Self, ManagerError> {
        let worktree = FsWorktree::new(project_dir)?;

        let work_dir = fs::canonicalize(git.work_dir()).map_err(|source| WorktreeError::InvalidRoot {
            path: git.work_dir().to_path_buf(),
            source,
        })?;
        let rel = worktree
            .root()
            .strip_prefix(&work_dir)
            .map_err(|_| ManagerError::OutsideRepository {
                project_dir: worktree.root().to_path_buf(),
                work_dir: work_dir.clone(),
            })?;
        let layout = ProjectLayout::subdir(&paths::to_slash(&rel.to_string_lossy()));

        let project_dir = worktree.root().to_path_buf();
        Self::new(cancel, project_dir, layout, options, Arc::new(git), Arc::new(worktree))
    }

    /// Build a manager over arbitrary sources.
    pub fn new(
        cancel: &Cancellation,
        project_dir: PathBuf,
        layout: ProjectLayout,
        options: ManagerOptions,
        repo: Arc<dyn VersionControl>,
        worktree: Arc<dyn Worktree>,
    ) -> Result<Self, ManagerError> {
        let head_commit = repo.head_commit()?;
        let sources = Sources::new(repo, worktree, head_commit.clone(), layout);

        debug!(
            project_dir = %project_dir.display(),
            commit = %head_commit,
            mode = %options.mode,
            "initializing giterminism manager"
        );

        let bootstrap = resolver::build(options.mode, sources.clone(), Arc::new(Policy::deny_all()));
        let policy = load_policy(cancel, bootstrap.as_ref(), &options.policy_file).map_err(ManagerError::Policy)?;
        let policy = Arc::new(policy);

        let resolver = resolver::build(options.mode, sources, policy.clone());
        let inspector = Inspector::new(options.mode, policy.clone());

        Ok(Self {
            project_dir,
            head_commit,
            options,
            policy,
            resolver,
            inspector,
        })
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn head_commit(&self) -> &CommitId {
        &self.head_commit
    }

    pub fn mode(&self) -> Mode {
        self.options.mode
    }

    pub fn options(&self) -> &ManagerOptions {
        &self.options
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    /// The capability bundle handed to configuration consumers.
    pub fn file_reader(&self) -> FileReader<'_> {
        FileReader::new(
            self.resolver.as_ref(),
            &self.inspector,
            &self.options.templates_dir,
            &self.options.chart_dir,
        )
    }
}

/// Read the policy document, if any, through `resolver`.
///
/// The document is its own category and is never allow-listed, so in
/// strict mode it must be committed and unchanged.
pub(crate) fn read_policy_document(
    cancel: &Cancellation,
    resolver: &dyn Resolver,
    path: &str,
) -> Result<Option<Vec<u8>>, GiterminismError> {
    if !resolver.is_configuration_file_exist_anywhere(cancel, path)? {
        return Ok(None);
    }

    resolver.check_configuration_file_existence(cancel, Category::GiterminismConfig, path)?;
    resolver
        .read_configuration_file(cancel, Category::GiterminismConfig, path)
        .map(Some)
}

fn load_policy(cancel: &Cancellation, resolver: &dyn Resolver, path: &str) -> Result<Policy, GiterminismError> {
    match read_policy_document(cancel, resolver, path)? {
        Some(bytes) => {
            debug!(%path, "loaded giterminism config");
            Ok(Policy::from_yaml(&bytes)?)
        }
        None => {
            debug!(%path, "giterminism config not found, denying all exceptions");
            Ok(Policy::deny_all())
        }
    }
}
