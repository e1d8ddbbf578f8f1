//! policy::document
//!
//! The giterminism policy document (`werf-giterminism.yaml`).
//!
//! # Example
//!
//! ```yaml
//! giterminismConfigVersion: 1
//! cli:
//!   allowCustomTags: true
//! config:
//!   allowUncommitted: false
//!   allowUncommittedTemplates: [".werf/local/**/*.tmpl"]
//!   goTemplateRendering:
//!     allowEnvVariables: ["CI_COMMIT_SHA", "/CI_.*/"]
//!     allowUncommittedFiles: ["generated/*"]
//!   stapel:
//!     allowFromLatest: false
//!     git:
//!       allowBranch: false
//!     mount:
//!       allowBuildDir: false
//!       allowFromPaths: ["~/.cache"]
//!   dockerfile:
//!     allowUncommitted: ["docker/Dockerfile.dev"]
//!     allowUncommittedDockerignoreFiles: []
//!     allowContextAddFiles: []
//! helm:
//!   allowUncommittedFiles: [".helm/values.local.yaml"]
//! ```
//!
//! Every section and field is optional; an absent field denies.

use serde::{Deserialize, Serialize};

use super::PolicyError;

/// The only supported document version.
pub const SUPPORTED_VERSION: u32 = 1;

/// Root of the policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PolicyDocument {
    /// Document schema version (must be 1)
    pub giterminism_config_version: u32,

    #[serde(default)]
    pub cli: CliSection,

    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub helm: HelmSection,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            giterminism_config_version: SUPPORTED_VERSION,
            cli: CliSection::default(),
            config: ConfigSection::default(),
            helm: HelmSection::default(),
        }
    }
}

impl PolicyDocument {
    /// Parse and validate a YAML document.
    ///
    /// # Errors
    ///
    /// - [`PolicyError::Document`] for syntax errors, wrong types, and
    ///   unknown fields
    /// - [`PolicyError::UnsupportedVersion`] for any version but 1
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, PolicyError> {
        let document: PolicyDocument =
            serde_yaml::from_slice(bytes).map_err(|e| PolicyError::Document {
                message: e.to_string(),
            })?;

        document.validate()?;
        Ok(document)
    }

    /// Validate values the schema cannot express.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.giterminism_config_version != SUPPORTED_VERSION {
            return Err(PolicyError::UnsupportedVersion(
                self.giterminism_config_version,
            ));
        }
        Ok(())
    }
}

/// `cli` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CliSection {
    pub allow_custom_tags: bool,
}

/// `config` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ConfigSection {
    /// Accept an uncommitted werf config
    pub allow_uncommitted: bool,
    /// Globs of werf config templates accepted uncommitted
    pub allow_uncommitted_templates: Vec<String>,
    pub go_template_rendering: GoTemplateRenderingSection,
    pub stapel: StapelSection,
    pub dockerfile: DockerfileSection,
}

/// `config.goTemplateRendering` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GoTemplateRenderingSection {
    /// Exact names or `/regex/` entries
    pub allow_env_variables: Vec<String>,
    /// Globs of files readable uncommitted from templates
    pub allow_uncommitted_files: Vec<String>,
}

/// `config.stapel` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StapelSection {
    pub allow_from_latest: bool,
    pub git: StapelGitSection,
    pub mount: StapelMountSection,
}

/// `config.stapel.git` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StapelGitSection {
    pub allow_branch: bool,
}

/// `config.stapel.mount` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StapelMountSection {
    pub allow_build_dir: bool,
    pub allow_from_paths: Vec<String>,
}

/// `config.dockerfile` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DockerfileSection {
    pub allow_uncommitted: Vec<String>,
    pub allow_uncommitted_dockerignore_files: Vec<String>,
    pub allow_context_add_files: Vec<String>,
}

/// `helm` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct HelmSection {
    pub allow_uncommitted_files: Vec<String>,
}
