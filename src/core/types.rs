//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`CommitId`] - Validated git commit identifier (SHA)
//! - [`Mode`] - Strict (giterminism) or loose resolution regime
//! - [`Category`] - Kind of configuration artifact being resolved
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use giterminism::core::types::{Category, CommitId, Mode};
//!
//! let commit = CommitId::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(commit.short(7), "abc123d");
//!
//! assert!("loose".parse::<Mode>().unwrap().is_loose());
//! assert_eq!(Category::Dockerfile.to_string(), "dockerfile");
//!
//! assert!(CommitId::new("not-a-sha").is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid commit id: {0}")]
    InvalidCommitId(String),

    #[error("invalid mode '{0}', must be one of: strict, loose")]
    InvalidMode(String),
}

/// A validated git commit identifier.
///
/// Accepts full-length SHA-1 (40 hex chars) and SHA-256 (64 hex chars)
/// ids. The id is normalized to lowercase.
///
/// # Example
///
/// ```
/// use giterminism::core::types::CommitId;
///
/// let id = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
///
/// assert!(CommitId::new("").is_err());
/// assert!(CommitId::new("abc123").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Create a new validated commit id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommitId` if the string is not a full hex id.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.len() != 40 && id.len() != 64 {
            return Err(TypeError::InvalidCommitId(format!(
                "expected 40 or 64 hex characters, got {}",
                id.len()
            )));
        }

        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidCommitId(format!(
                "'{}' contains non-hex characters",
                id
            )));
        }

        Ok(())
    }

    /// Get the commit id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get an abbreviated form of the id.
    ///
    /// Returns the first `len` characters, or the full id if `len` is
    /// larger than the id.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

/// Resolution regime.
///
/// In [`Mode::Strict`] only committed content (or explicitly allow-listed
/// exceptions) may be read. In [`Mode::Loose`] the worktree is
/// authoritative and no commit comparison is performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Giterminism mode: the commit snapshot wins.
    #[default]
    Strict,
    /// The live worktree wins.
    Loose,
}

impl Mode {
    /// Whether this is the loose regime.
    pub fn is_loose(self) -> bool {
        matches!(self, Mode::Loose)
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Strict => "strict",
            Mode::Loose => "loose",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Mode::Strict),
            "loose" => Ok(Mode::Loose),
            other => Err(TypeError::InvalidMode(other.to_string())),
        }
    }
}

/// The kind of configuration artifact being resolved.
///
/// A category selects the policy allow-list consulted for a path and the
/// vocabulary used in error messages. It carries no behavior of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// The top-level werf config (`werf.yaml`).
    Config,
    /// A werf config template (`.werf/**/*.tmpl`).
    ConfigTemplate,
    /// A file read from go-template rendering (`.Files.Get`, `.Files.Glob`).
    ConfigGoTemplateFile,
    /// A Dockerfile.
    Dockerfile,
    /// A `.dockerignore` file.
    Dockerignore,
    /// A file inside a helm chart.
    ChartFile,
    /// A helm chart directory.
    ChartDirectory,
    /// The giterminism policy document itself.
    GiterminismConfig,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 8] = [
        Category::Config,
        Category::ConfigTemplate,
        Category::ConfigGoTemplateFile,
        Category::Dockerfile,
        Category::Dockerignore,
        Category::ChartFile,
        Category::ChartDirectory,
        Category::GiterminismConfig,
    ];

    /// Singular noun used in messages.
    pub fn noun(self) -> &'static str {
        match self {
            Category::Config => "werf config",
            Category::ConfigTemplate => "werf config template",
            Category::ConfigGoTemplateFile => "file",
            Category::Dockerfile => "dockerfile",
            Category::Dockerignore => "dockerignore file",
            Category::ChartFile => "chart file",
            Category::ChartDirectory => "chart directory",
            Category::GiterminismConfig => "giterminism config",
        }
    }

    /// Plural noun used in multi-path messages.
    pub fn plural(self) -> &'static str {
        match self {
            Category::Config => "werf configs",
            Category::ConfigTemplate => "werf config templates",
            Category::ConfigGoTemplateFile => "files",
            Category::Dockerfile => "dockerfiles",
            Category::Dockerignore => "dockerignore files",
            Category::ChartFile => "chart files",
            Category::ChartDirectory => "chart directories",
            Category::GiterminismConfig => "giterminism configs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod commit_id {
        use super::*;

        #[test]
        fn valid_sha1() {
            assert!(CommitId::new("abc123def4567890abc123def4567890abc12345").is_ok());
        }

        #[test]
        fn valid_sha256() {
            let id = "a".repeat(64);
            assert!(CommitId::new(id).is_ok());
        }

        #[test]
        fn normalizes_case() {
            let id = CommitId::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
            assert_eq!(id.as_str(), "abc123def4567890abc123def4567890abc12345");
        }

        #[test]
        fn rejects_wrong_length() {
            assert!(CommitId::new("abc").is_err());
            assert!(CommitId::new("a".repeat(41)).is_err());
        }

        #[test]
        fn rejects_non_hex() {
            assert!(CommitId::new("g".repeat(40)).is_err());
        }

        #[test]
        fn short_clamps() {
            let id = CommitId::new("abc123def4567890abc123def4567890abc12345").unwrap();
            assert_eq!(id.short(7), "abc123d");
            assert_eq!(id.short(100).len(), 40);
        }

        #[test]
        fn serde_roundtrip() {
            let id = CommitId::new("abc123def4567890abc123def4567890abc12345").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            let parsed: CommitId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, parsed);
        }
    }

    mod mode {
        use super::*;

        #[test]
        fn default_is_strict() {
            assert_eq!(Mode::default(), Mode::Strict);
            assert!(!Mode::default().is_loose());
        }

        #[test]
        fn parses_case_insensitively() {
            assert_eq!("Loose".parse::<Mode>().unwrap(), Mode::Loose);
            assert_eq!(" strict ".parse::<Mode>().unwrap(), Mode::Strict);
        }

        #[test]
        fn rejects_unknown() {
            assert_eq!(
                "relaxed".parse::<Mode>(),
                Err(TypeError::InvalidMode("relaxed".into()))
            );
        }
    }

    #[test]
    fn category_vocabulary() {
        assert_eq!(Category::Config.to_string(), "werf config");
        assert_eq!(Category::ConfigGoTemplateFile.plural(), "files");
        assert_eq!(Category::ChartDirectory.plural(), "chart directories");
        for category in Category::ALL {
            assert!(!category.noun().is_empty());
            assert_ne!(category.noun(), category.plural());
        }
    }
}
