//! policy
//!
//! The giterminism policy: which deviations from the commit snapshot are
//! accepted.
//!
//! # Architecture
//!
//! [`Policy`] wraps a validated [`PolicyDocument`] and answers yes/no
//! questions about it. It never changes after construction and holds no
//! interior mutability, so one instance can be shared freely between
//! threads.
//!
//! Unconditional toggles return `bool`. Path- and name-scoped checks return
//! `Result<bool, PolicyError>` because an allow-list entry may be malformed.
//!
//! # Example
//!
//! ```
//! use giterminism::core::types::Category;
//! use giterminism::policy::Policy;
//!
//! let policy = Policy::from_yaml(br#"
//! giterminismConfigVersion: 1
//! config:
//!   allowUncommittedTemplates: [".werf/local/*"]
//! "#).unwrap();
//!
//! assert!(policy.is_uncommitted_accepted(Category::ConfigTemplate, ".werf/local/a.tmpl").unwrap());
//! assert!(!policy.is_uncommitted_accepted(Category::ConfigTemplate, ".werf/a.tmpl").unwrap());
//! assert!(!policy.is_uncommitted_config_accepted());
//! ```

pub mod document;
pub mod matcher;

pub use document::PolicyDocument;

use thiserror::Error;

use crate::core::types::Category;
use matcher::{ExactAllowList, GlobAllowList};

/// Errors from policy loading and matching.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A glob allow-list entry is malformed.
    #[error("unable to match path (pattern: \"{pattern}\", path \"{path}\"): {message}")]
    InvalidPattern {
        pattern: String,
        path: String,
        message: String,
    },

    /// A `/regex/` allow-list entry does not compile.
    #[error("invalid env name pattern \"{pattern}\": {message}")]
    InvalidEnvPattern { pattern: String, message: String },

    /// The document failed to parse or validate.
    #[error("the giterminism config validation failed: {message}")]
    Document { message: String },

    /// The document declares a version this build does not understand.
    #[error("the giterminism config validation failed: unsupported giterminismConfigVersion {0}, expected 1")]
    UnsupportedVersion(u32),
}

/// An immutable set of giterminism decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    document: PolicyDocument,
}

impl Policy {
    /// The policy that accepts nothing.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Build a policy from a validated document.
    pub fn new(document: PolicyDocument) -> Result<Self, PolicyError> {
        document.validate()?;
        Ok(Self { document })
    }

    /// Parse a YAML policy document.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, PolicyError> {
        Ok(Self {
            document: PolicyDocument::from_yaml(bytes)?,
        })
    }

    /// The underlying document.
    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }

    // =========================================================================
    // Per-category dispatch
    // =========================================================================

    /// Whether `path` of the given category may be read from the worktree
    /// without matching the commit.
    ///
    /// The policy document itself is never accepted.
    pub fn is_uncommitted_accepted(&self, category: Category, path: &str) -> Result<bool, PolicyError> {
        match category {
            Category::Config => Ok(self.is_uncommitted_config_accepted()),
            Category::ConfigTemplate => self.is_uncommitted_config_template_file_accepted(path),
            Category::ConfigGoTemplateFile => {
                self.is_uncommitted_config_go_template_rendering_file_accepted(path)
            }
            Category::Dockerfile => self.is_uncommitted_dockerfile_accepted(path),
            Category::Dockerignore => self.is_uncommitted_dockerignore_accepted(path),
            Category::ChartFile | Category::ChartDirectory => {
                self.is_uncommitted_helm_file_accepted(path)
            }
            Category::GiterminismConfig => Ok(false),
        }
    }

    // =========================================================================
    // cli
    // =========================================================================

    pub fn is_custom_tags_accepted(&self) -> bool {
        self.document.cli.allow_custom_tags
    }

    // =========================================================================
    // config
    // =========================================================================

    pub fn is_uncommitted_config_accepted(&self) -> bool {
        self.document.config.allow_uncommitted
    }

    pub fn is_uncommitted_config_template_file_accepted(&self, path: &str) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.config.allow_uncommitted_templates).is_matched(path)
    }

    pub fn is_uncommitted_config_go_template_rendering_file_accepted(
        &self,
        path: &str,
    ) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.config.go_template_rendering.allow_uncommitted_files)
            .is_matched(path)
    }

    /// Env names are compared verbatim unless the entry is a `/regex/`.
    pub fn is_config_go_template_rendering_env_name_accepted(&self, name: &str) -> Result<bool, PolicyError> {
        ExactAllowList::new(&self.document.config.go_template_rendering.allow_env_variables)
            .is_matched(name)
    }

    pub fn is_config_stapel_from_latest_accepted(&self) -> bool {
        self.document.config.stapel.allow_from_latest
    }

    pub fn is_config_stapel_git_branch_accepted(&self) -> bool {
        self.document.config.stapel.git.allow_branch
    }

    pub fn is_config_stapel_mount_build_dir_accepted(&self) -> bool {
        self.document.config.stapel.mount.allow_build_dir
    }

    pub fn is_config_stapel_mount_from_path_accepted(&self, from_path: &str) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.config.stapel.mount.allow_from_paths).is_matched(from_path)
    }

    pub fn is_config_dockerfile_context_add_file_accepted(&self, path: &str) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.config.dockerfile.allow_context_add_files).is_matched(path)
    }

    pub fn is_uncommitted_dockerfile_accepted(&self, path: &str) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.config.dockerfile.allow_uncommitted).is_matched(path)
    }

    pub fn is_uncommitted_dockerignore_accepted(&self, path: &str) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.config.dockerfile.allow_uncommitted_dockerignore_files)
            .is_matched(path)
    }

    // =========================================================================
    // helm
    // =========================================================================

    pub fn is_uncommitted_helm_file_accepted(&self, path: &str) -> Result<bool, PolicyError> {
        GlobAllowList::new(&self.document.helm.allow_uncommitted_files).is_matched(path)
    }
}
