//! errors
//!
//! User-facing error taxonomy.
//!
//! Every failure the resolver, inspector and manager report is a
//! [`GiterminismError`]. Multi-path variants carry their paths sorted,
//! deduplicated and forward-slashed, so the rendered message is stable
//! across runs and platforms.
//!
//! # Rendering
//!
//! ```text
//! the uncommitted configuration found in the project directory: the following werf config templates must be committed:
//!
//!  - .werf/a.tmpl
//!  - .werf/b.tmpl
//!
//! Read more about giterminism and how to allow exceptions: https://werf.io/...
//! ```
//!
//! # Example
//!
//! ```
//! use giterminism::core::types::Category;
//! use giterminism::errors::GiterminismError;
//!
//! let err = GiterminismError::uncommitted_files_changes(Category::Config, ["werf.yaml"]);
//! assert!(err.to_string().starts_with(
//!     "the uncommitted configuration found in the project directory: the werf config \"werf.yaml\" changes must be committed"
//! ));
//! assert_eq!(err.paths(), ["werf.yaml"]);
//! ```

use thiserror::Error;

use crate::core::paths;
use crate::core::types::Category;
use crate::git::GitError;
use crate::policy::PolicyError;
use crate::worktree::WorktreeError;

/// Where to read about policy exceptions.
pub const DOCS_URL: &str = "https://werf.io/documentation/usage/project_configuration/giterminism.html";

const UNCOMMITTED_PREFIX: &str = "the uncommitted configuration found in the project directory";
const EXTERNAL_PREFIX: &str = "the configuration with potential external dependency found in the werf config";

/// Errors reported by the giterminism layer.
#[derive(Debug, Error)]
pub enum GiterminismError {
    /// None of the default-named werf configs exists in either source.
    #[error("{}", config_not_found(.candidates))]
    ConfigNotFound {
        /// Names that were tried, in order
        candidates: Vec<String>,
    },

    /// Missing from the worktree where the worktree is authoritative.
    #[error("{}", not_found(.category, .paths, "the project directory", false))]
    FilesNotFoundInProjectDirectory { category: Category, paths: Vec<String> },

    /// Missing from the commit snapshot in strict mode.
    #[error("{}", not_found(.category, .paths, "the project git repository", true))]
    FilesNotFoundInProjectGitRepository { category: Category, paths: Vec<String> },

    /// Present only in the worktree and not allow-listed.
    #[error("{}", uncommitted(.category, .paths))]
    UncommittedFiles { category: Category, paths: Vec<String> },

    /// Worktree content differs from the commit and is not allow-listed.
    #[error("{}", uncommitted_changes(.category, .paths))]
    UncommittedFilesChanges { category: Category, paths: Vec<String> },

    /// A non-file dependency is not allowed by the policy.
    #[error("{}", external_dependency(.message))]
    ExternalDependencyFound { message: String },

    /// A glob passed to the resolver is malformed.
    #[error("invalid glob pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A policy allow-list entry or document is invalid.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// The commit snapshot could not be read.
    #[error(transparent)]
    Git(GitError),

    /// The project directory could not be read.
    #[error(transparent)]
    Worktree(WorktreeError),

    /// The request was cancelled.
    #[error("operation cancelled")]
    Cancelled,
}

impl GiterminismError {
    pub fn config_not_found<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GiterminismError::ConfigNotFound {
            candidates: candidates
                .into_iter()
                .map(|c| paths::to_slash(c.as_ref()))
                .collect(),
        }
    }

    pub fn files_not_found_in_project_directory<I, S>(category: Category, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GiterminismError::FilesNotFoundInProjectDirectory {
            category,
            paths: path_list(paths),
        }
    }

    pub fn files_not_found_in_project_git_repository<I, S>(category: Category, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GiterminismError::FilesNotFoundInProjectGitRepository {
            category,
            paths: path_list(paths),
        }
    }

    pub fn uncommitted_files<I, S>(category: Category, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GiterminismError::UncommittedFiles {
            category,
            paths: path_list(paths),
        }
    }

    pub fn uncommitted_files_changes<I, S>(category: Category, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        GiterminismError::UncommittedFilesChanges {
            category,
            paths: path_list(paths),
        }
    }

    pub fn external_dependency_found(message: impl Into<String>) -> Self {
        GiterminismError::ExternalDependencyFound {
            message: message.into(),
        }
    }

    /// Paths named by the error (empty for non-path errors).
    pub fn paths(&self) -> &[String] {
        match self {
            GiterminismError::FilesNotFoundInProjectDirectory { paths, .. }
            | GiterminismError::FilesNotFoundInProjectGitRepository { paths, .. }
            | GiterminismError::UncommittedFiles { paths, .. }
            | GiterminismError::UncommittedFilesChanges { paths, .. } => paths,
            _ => &[],
        }
    }

    /// Category of the offending files, if any.
    pub fn category(&self) -> Option<Category> {
        match self {
            GiterminismError::FilesNotFoundInProjectDirectory { category, .. }
            | GiterminismError::FilesNotFoundInProjectGitRepository { category, .. }
            | GiterminismError::UncommittedFiles { category, .. }
            | GiterminismError::UncommittedFilesChanges { category, .. } => Some(*category),
            _ => None,
        }
    }

    /// Whether this is one of the "not found" kinds (including
    /// [`GiterminismError::ConfigNotFound`]).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GiterminismError::ConfigNotFound { .. }
                | GiterminismError::FilesNotFoundInProjectDirectory { .. }
                | GiterminismError::FilesNotFoundInProjectGitRepository { .. }
        )
    }
}

impl From<GitError> for GiterminismError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Cancelled => GiterminismError::Cancelled,
            other => GiterminismError::Git(other),
        }
    }
}

impl From<WorktreeError> for GiterminismError {
    fn from(err: WorktreeError) -> Self {
        match err {
            WorktreeError::Cancelled => GiterminismError::Cancelled,
            other => GiterminismError::Worktree(other),
        }
    }
}

impl From<crate::core::cancel::Cancelled> for GiterminismError {
    fn from(_: crate::core::cancel::Cancelled) -> Self {
        GiterminismError::Cancelled
    }
}

// =============================================================================
// Rendering
// =============================================================================

fn path_list<I, S>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut list: Vec<String> = paths
        .into_iter()
        .map(|p| paths::to_slash(p.as_ref()))
        .collect();
    list.sort();
    list.dedup();
    list
}

fn bullet_list(paths: &[String]) -> String {
    paths
        .iter()
        .map(|p| format!(" - {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

fn docs_pointer() -> String {
    format!("Read more about giterminism and how to allow exceptions: {}", DOCS_URL)
}

fn external_dependency(message: &str) -> String {
    format!("{}: {}\n\n{}", EXTERNAL_PREFIX, message, docs_pointer())
}

fn config_not_found(candidates: &[String]) -> String {
    let names = candidates
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "the werf config not found in the project directory or the project git repository (tried {})",
        names
    )
}

fn not_found(category: &Category, paths: &[String], location: &str, with_pointer: bool) -> String {
    let message = match paths {
        [single] => format!("the {} \"{}\" not found in {}", category.noun(), single, location),
        _ => format!(
            "the following {} not found in {}:\n\n{}",
            category.plural(),
            location,
            bullet_list(paths)
        ),
    };

    if with_pointer {
        format!("{}\n\n{}", message, docs_pointer())
    } else {
        message
    }
}

fn uncommitted(category: &Category, paths: &[String]) -> String {
    let body = match paths {
        [single] => format!("the {} \"{}\" must be committed", category.noun(), single),
        _ => format!(
            "the following {} must be committed:\n\n{}",
            category.plural(),
            bullet_list(paths)
        ),
    };
    format!("{}: {}\n\n{}", UNCOMMITTED_PREFIX, body, docs_pointer())
}

fn uncommitted_changes(category: &Category, paths: &[String]) -> String {
    let body = match paths {
        [single] => format!("the {} \"{}\" changes must be committed", category.noun(), single),
        _ => format!(
            "changes in the following {} must be committed:\n\n{}",
            category.plural(),
            bullet_list(paths)
        ),
    };
    format!("{}: {}\n\n{}", UNCOMMITTED_PREFIX, body, docs_pointer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_uncommitted_file() {
        let err = GiterminismError::uncommitted_files(Category::Dockerfile, ["docker/Dockerfile"]);
        assert_eq!(
            err.to_string(),
            format!(
                "the uncommitted configuration found in the project directory: the dockerfile \"docker/Dockerfile\" must be committed\n\n{}",
                docs_pointer()
            )
        );
    }

    #[test]
    fn multiple_uncommitted_files_are_sorted_and_deduplicated() {
        let err = GiterminismError::uncommitted_files(
            Category::ConfigTemplate,
            [".werf/b.tmpl", ".werf/a.tmpl", ".werf/b.tmpl"],
        );

        assert_eq!(err.paths(), [".werf/a.tmpl", ".werf/b.tmpl"]);
        assert!(err.to_string().contains(
            "the following werf config templates must be committed:\n\n - .werf/a.tmpl\n - .werf/b.tmpl\n\n"
        ));
        assert!(err.to_string().ends_with(DOCS_URL));
    }

    #[test]
    fn changes_wording() {
        let err = GiterminismError::uncommitted_files_changes(Category::ConfigGoTemplateFile, ["a", "b"]);
        assert!(err
            .to_string()
            .contains("changes in the following files must be committed:\n\n - a\n - b"));
    }

    #[test]
    fn not_found_wording() {
        let dir = GiterminismError::files_not_found_in_project_directory(Category::ChartFile, [".helm/a"]);
        assert_eq!(
            dir.to_string(),
            "the chart file \".helm/a\" not found in the project directory"
        );

        let repo = GiterminismError::files_not_found_in_project_git_repository(Category::Config, ["werf.yaml"]);
        assert!(repo
            .to_string()
            .starts_with("the werf config \"werf.yaml\" not found in the project git repository\n\n"));
        assert!(repo.is_not_found());
        assert_eq!(repo.category(), Some(Category::Config));
    }

    #[test]
    fn config_not_found_lists_candidates() {
        let err = GiterminismError::config_not_found(["werf.yaml", "werf.yml"]);
        assert!(err.to_string().contains("\"werf.yaml\", \"werf.yml\""));
        assert!(err.is_not_found());
        assert!(err.paths().is_empty());
    }

    #[test]
    fn external_dependency() {
        let err = GiterminismError::external_dependency_found("env name \"HOME\" not allowed by giterminism");
        assert!(err.to_string().starts_with(
            "the configuration with potential external dependency found in the werf config: env name \"HOME\" not allowed by giterminism"
        ));
    }

    #[test]
    fn cancellation_is_unified() {
        assert!(matches!(
            GiterminismError::from(GitError::Cancelled),
            GiterminismError::Cancelled
        ));
        assert!(matches!(
            GiterminismError::from(WorktreeError::Cancelled),
            GiterminismError::Cancelled
        ));
    }
}
