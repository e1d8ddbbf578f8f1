//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$GITERMINISM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/giterminism/config.toml`
//! 3. `~/.giterminism/config.toml`
//!
//! # Repo Config
//!
//! Located at `<git_dir>/giterminism/config.toml`. It lives inside the git
//! directory so that it can never become part of a commit snapshot.
//!
//! # Validation
//!
//! Path-valued settings must be non-empty project-relative paths that do
//! not escape the project directory.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::paths;
use crate::core::types::Mode;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// mode = "strict"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default resolution regime
    pub mode: Option<Mode>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// mode = "loose"
/// policy_file = "werf-giterminism.yaml"
/// config_path = "werf.yaml"
/// templates_dir = ".werf"
/// chart_dir = ".helm"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Resolution regime for this repository
    pub mode: Option<Mode>,

    /// Project-relative path of the giterminism policy document
    pub policy_file: Option<String>,

    /// Project-relative path of the werf config (empty: default names)
    pub config_path: Option<String>,

    /// Project-relative directory holding werf config templates
    pub templates_dir: Option<String>,

    /// Project-relative helm chart directory
    pub chart_dir: Option<String>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a path setting is empty,
    /// absolute, or escapes the project directory.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rel_path("policy_file", self.policy_file.as_deref())?;
        validate_rel_path("templates_dir", self.templates_dir.as_deref())?;
        validate_rel_path("chart_dir", self.chart_dir.as_deref())?;

        if let Some(path) = self.config_path.as_deref().filter(|p| !p.is_empty()) {
            validate_rel_path("config_path", Some(path))?;
        }

        Ok(())
    }
}

fn validate_rel_path(key: &str, value: Option<&str>) -> Result<(), ConfigError> {
    let Some(value) = value else {
        return Ok(());
    };

    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue(format!("{} cannot be empty", key)));
    }

    if value.starts_with('/') || std::path::Path::new(value).is_absolute() {
        return Err(ConfigError::InvalidValue(format!(
            "{} must be relative to the project directory, got '{}'",
            key, value
        )));
    }

    let normalized = paths::normalize(value);
    if normalized.is_empty() || paths::escapes_root(&normalized) {
        return Err(ConfigError::InvalidValue(format!(
            "{} must point inside the project directory, got '{}'",
            key, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_repo_config_is_valid() {
        assert!(RepoConfig::default().validate().is_ok());
    }

    #[test]
    fn parses_all_fields() {
        let config: RepoConfig = toml::from_str(
            r#"
            mode = "loose"
            policy_file = "ci/giterminism.yaml"
            config_path = "deploy/werf.yaml"
            templates_dir = ".werf"
            chart_dir = "deploy/.helm"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, Some(Mode::Loose));
        assert_eq!(config.policy_file.as_deref(), Some("ci/giterminism.yaml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_mode_rejected_at_parse() {
        let result: Result<RepoConfig, _> = toml::from_str(r#"mode = "relaxed""#);
        assert!(result.is_err());
    }

    #[test]
    fn escaping_policy_file_rejected() {
        let config = RepoConfig {
            policy_file: Some("../outside.yaml".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn absolute_chart_dir_rejected() {
        let config = RepoConfig {
            chart_dir: Some("/etc/chart".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_config_path_means_default_names() {
        let config = RepoConfig {
            config_path: Some(String::new()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
