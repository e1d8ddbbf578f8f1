//! inspector
//!
//! Point checks for dependencies that are not files.
//!
//! Each check passes in loose mode or when the policy accepts the
//! dependency; otherwise it fails with
//! [`GiterminismError::ExternalDependencyFound`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use giterminism::core::types::Mode;
//! use giterminism::inspector::Inspector;
//! use giterminism::policy::Policy;
//!
//! let inspector = Inspector::new(Mode::Strict, Arc::new(Policy::deny_all()));
//! assert!(inspector.inspect_custom_tags().is_err());
//!
//! let inspector = Inspector::new(Mode::Loose, Arc::new(Policy::deny_all()));
//! assert!(inspector.inspect_custom_tags().is_ok());
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::core::types::Mode;
use crate::errors::GiterminismError;
use crate::policy::{Policy, PolicyError};

/// Stateless checks against the policy.
#[derive(Debug, Clone)]
pub struct Inspector {
    mode: Mode,
    policy: Arc<Policy>,
}

impl Inspector {
    pub fn new(mode: Mode, policy: Arc<Policy>) -> Self {
        Self { mode, policy }
    }

    /// `--add-custom-tag` on the command line.
    pub fn inspect_custom_tags(&self) -> Result<(), GiterminismError> {
        self.check(
            || Ok(self.policy.is_custom_tags_accepted()),
            || "custom tags not allowed by giterminism".to_string(),
        )
    }

    /// `fromLatest: true` in a stapel image.
    pub fn inspect_config_stapel_from_latest(&self) -> Result<(), GiterminismError> {
        self.check(
            || Ok(self.policy.is_config_stapel_from_latest_accepted()),
            || "fromLatest: true not allowed by giterminism".to_string(),
        )
    }

    /// A remote git directive pinned to a branch.
    pub fn inspect_config_stapel_git_branch(&self) -> Result<(), GiterminismError> {
        self.check(
            || Ok(self.policy.is_config_stapel_git_branch_accepted()),
            || "git branch directive not allowed by giterminism".to_string(),
        )
    }

    /// A `build_dir` mount.
    pub fn inspect_config_stapel_mount_build_dir(&self) -> Result<(), GiterminismError> {
        self.check(
            || Ok(self.policy.is_config_stapel_mount_build_dir_accepted()),
            || "\"from: build_dir\" mount not allowed by giterminism".to_string(),
        )
    }

    /// A `fromPath` mount.
    pub fn inspect_config_stapel_mount_from_path(&self, from_path: &str) -> Result<(), GiterminismError> {
        self.check(
            || self.policy.is_config_stapel_mount_from_path_accepted(from_path),
            || format!("\"fromPath: {}\" mount not allowed by giterminism", from_path),
        )
    }

    /// A `contextAddFiles` entry of a Dockerfile image.
    pub fn inspect_config_dockerfile_context_add_file(&self, path: &str) -> Result<(), GiterminismError> {
        self.check(
            || self.policy.is_config_dockerfile_context_add_file_accepted(path),
            || format!("contextAddFile \"{}\" not allowed by giterminism", path),
        )
    }

    /// An environment variable read during template rendering.
    pub fn inspect_config_go_template_rendering_env(&self, name: &str) -> Result<(), GiterminismError> {
        self.check(
            || self.policy.is_config_go_template_rendering_env_name_accepted(name),
            || format!("env name \"{}\" not allowed by giterminism", name),
        )
    }

    /// The policy decision is only evaluated in strict mode.
    fn check(
        &self,
        accepted: impl FnOnce() -> Result<bool, PolicyError>,
        message: impl FnOnce() -> String,
    ) -> Result<(), GiterminismError> {
        if self.mode.is_loose() || accepted()? {
            return Ok(());
        }

        let message = message();
        debug!(%message, "external dependency rejected");
        Err(GiterminismError::external_dependency_found(message))
    }
}
