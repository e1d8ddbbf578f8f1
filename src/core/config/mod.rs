//! core::config
//!
//! Tool configuration schema and loading.
//!
//! This is configuration of the resolver itself (mode, where the policy
//! document lives, default directories). The giterminism policy document
//! is a separate artifact read through the resolver; see [`crate::policy`].
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. `WERF_LOOSE_GITERMINISM` environment variable
//! 5. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$GITERMINISM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/giterminism/config.toml`
//! 3. `~/.giterminism/config.toml`
//!
//! # Repo Config Location
//!
//! `<git_dir>/giterminism/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use giterminism::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("Mode: {}", config.mode());
//! println!("Policy: {}", config.policy_file());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::Mode;

/// Default policy document name.
pub const DEFAULT_POLICY_FILE: &str = "werf-giterminism.yaml";

/// Default werf config templates directory.
pub const DEFAULT_TEMPLATES_DIR: &str = ".werf";

/// Default helm chart directory.
pub const DEFAULT_CHART_DIR: &str = ".helm";

/// Environment variable forcing loose mode.
pub const LOOSE_ENV_VAR: &str = "WERF_LOOSE_GITERMINISM";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules. Repo config overrides global
/// config, and the environment overrides both.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// Value of `WERF_LOOSE_GITERMINISM`, if set
    env_loose: Option<bool>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads repo-specific config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or
    /// contain invalid values. Missing config files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (repo, repo_path) = match git_dir {
            Some(dir) => Self::load_repo(dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        let env_loose = std::env::var(LOOSE_ENV_VAR).ok().map(|v| parse_truthy(&v));

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                env_loose,
                global_path,
                repo_path,
            },
        })
    }

    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        if let Ok(path) = std::env::var("GITERMINISM_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("giterminism/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".giterminism/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(git_dir: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(git_dir);
        if !path.exists() {
            return Ok((None, None));
        }

        let config = read_toml(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Get the path of the repo config for a git directory.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("giterminism/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the resolution regime.
    ///
    /// A truthy `WERF_LOOSE_GITERMINISM` forces loose mode, a falsy one
    /// forces strict mode. Defaults to strict.
    pub fn mode(&self) -> Mode {
        if let Some(loose) = self.env_loose {
            return if loose { Mode::Loose } else { Mode::Strict };
        }

        self.repo
            .as_ref()
            .and_then(|r| r.mode)
            .or(self.global.mode)
            .unwrap_or_default()
    }

    /// Get the policy document path.
    ///
    /// Defaults to `werf-giterminism.yaml`.
    pub fn policy_file(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.policy_file.as_deref())
            .unwrap_or(DEFAULT_POLICY_FILE)
    }

    /// Get the custom werf config path.
    ///
    /// Empty means the default names are searched.
    pub fn config_path(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.config_path.as_deref())
            .unwrap_or("")
    }

    /// Get the werf config templates directory.
    ///
    /// Defaults to `.werf`.
    pub fn templates_dir(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.templates_dir.as_deref())
            .unwrap_or(DEFAULT_TEMPLATES_DIR)
    }

    /// Get the helm chart directory.
    ///
    /// Defaults to `.helm`.
    pub fn chart_dir(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.chart_dir.as_deref())
            .unwrap_or(DEFAULT_CHART_DIR)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
