//! Integration tests for resolution against real repositories.
//!
//! These tests use real git repositories created via tempfile, so the
//! commit snapshot goes through git2 and the project directory through the
//! filesystem walker.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use giterminism::core::cancel::Cancellation;
use giterminism::core::types::Mode;
use giterminism::errors::GiterminismError;
use giterminism::git::{Git, VersionControl};
use giterminism::manager::{Manager, ManagerError, ManagerOptions};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "core.autocrlf", "false"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    /// Get the path to the repository.
    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the worktree, creating parent directories.
    fn write(&self, path: &str, content: &str) {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    /// Stage everything and commit.
    fn commit_all(&self, message: &str) {
        run_git(self.path(), &["add", "-A"]);
        run_git(self.path(), &["commit", "-m", message]);
    }

    /// Open a manager for the repository root.
    fn manager(&self, mode: Mode) -> Manager {
        self.try_manager_at(self.path(), mode)
            .expect("failed to open manager")
    }

    fn try_manager_at(&self, dir: &Path, mode: Mode) -> Result<Manager, ManagerError> {
        let options = ManagerOptions {
            mode,
            ..Default::default()
        };
        Manager::open(&Cancellation::new(), dir, options)
    }
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn identical_config_is_read_from_commit() {
    let repo = TestRepo::new();
    repo.write("werf.yaml", "project: demo\nconfigVersion: 1\n");
    repo.commit_all("Add werf.yaml");

    let manager = repo.manager(Mode::Strict);
    let (path, bytes) = manager
        .file_reader()
        .read_config(&Cancellation::new(), "")
        .unwrap();

    assert_eq!(path, "werf.yaml");
    assert_eq!(bytes, b"project: demo\nconfigVersion: 1\n");
}

#[test]
fn one_extra_character_is_reported() {
    let repo = TestRepo::new();
    repo.write("werf.yaml", "project: demo\n");
    repo.commit_all("Add werf.yaml");
    repo.write("werf.yaml", "project: demo!\n");

    let manager = repo.manager(Mode::Strict);
    let err = manager
        .file_reader()
        .read_config(&Cancellation::new(), "")
        .unwrap_err();

    assert!(matches!(err, GiterminismError::UncommittedFilesChanges { .. }));
    assert_eq!(err.paths(), ["werf.yaml"]);
}

#[test]
fn loose_mode_reads_untracked_config() {
    let repo = TestRepo::new();
    repo.write("werf.yaml", "project: local\n");

    let manager = repo.manager(Mode::Loose);
    let (_, bytes) = manager
        .file_reader()
        .read_config(&Cancellation::new(), "")
        .unwrap();

    assert_eq!(bytes, b"project: local\n");
}

#[test]
fn untracked_template_is_reported() {
    let repo = TestRepo::new();
    repo.write(".werf/a.tmpl", "{{ define \"a\" }}{{ end }}\n");
    repo.commit_all("Add template");
    repo.write(".werf/b.tmpl", "{{ define \"b\" }}{{ end }}\n");

    let manager = repo.manager(Mode::Strict);
    let err = manager
        .file_reader()
        .read_config_template_files(&Cancellation::new(), "", |_, _| {
            Ok::<(), GiterminismError>(())
        })
        .unwrap_err();

    assert!(matches!(err, GiterminismError::UncommittedFiles { .. }));
    assert!(err
        .to_string()
        .contains("the werf config template \".werf/b.tmpl\" must be committed"));
}

#[test]
fn crlf_worktree_copy_is_not_drift() {
    let repo = TestRepo::new();
    repo.write("Dockerfile", "FROM alpine\nRUN true\n");
    repo.commit_all("Add Dockerfile");
    repo.write("Dockerfile", "FROM alpine\r\nRUN true\r\n");

    let manager = repo.manager(Mode::Strict);
    let bytes = manager
        .file_reader()
        .read_dockerfile(&Cancellation::new(), "Dockerfile")
        .unwrap();

    assert_eq!(bytes, b"FROM alpine\nRUN true\n");
}

#[test]
fn three_untracked_files_in_one_error() {
    let repo = TestRepo::new();
    repo.write("files/a.txt", "a");
    repo.write("files/b.txt", "b");
    repo.write("files/c.txt", "c");

    let manager = repo.manager(Mode::Strict);
    let err = manager
        .file_reader()
        .config_go_template_files_glob(&Cancellation::new(), "files/*.txt")
        .unwrap_err();

    assert_eq!(err.paths(), ["files/a.txt", "files/b.txt", "files/c.txt"]);
}

// =============================================================================
// Policy
// =============================================================================

#[test]
fn committed_policy_allows_uncommitted_dockerfile() {
    let repo = TestRepo::new();
    repo.write(
        "werf-giterminism.yaml",
        "giterminismConfigVersion: 1\nconfig:\n  dockerfile:\n    allowUncommitted: [Dockerfile.dev]\n",
    );
    repo.commit_all("Add policy");
    repo.write("Dockerfile.dev", "FROM local\n");

    let manager = repo.manager(Mode::Strict);
    let bytes = manager
        .file_reader()
        .read_dockerfile(&Cancellation::new(), "Dockerfile.dev")
        .unwrap();

    assert_eq!(bytes, b"FROM local\n");
}

#[test]
fn uncommitted_policy_fails_manager() {
    let repo = TestRepo::new();
    repo.write("werf-giterminism.yaml", "giterminismConfigVersion: 1\n");

    let err = repo.try_manager_at(repo.path(), Mode::Strict).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Policy(GiterminismError::UncommittedFiles { .. })
    ));
}

// =============================================================================
// Layout
// =============================================================================

#[test]
fn project_in_subdirectory() {
    let repo = TestRepo::new();
    repo.write("app/werf.yaml", "project: app\n");
    repo.write("other/werf.yaml", "project: other\n");
    repo.commit_all("Add projects");

    let manager = repo
        .try_manager_at(&repo.path().join("app"), Mode::Strict)
        .unwrap();
    let (path, bytes) = manager
        .file_reader()
        .read_config(&Cancellation::new(), "")
        .unwrap();

    assert_eq!(path, "werf.yaml");
    assert_eq!(bytes, b"project: app\n");
}

#[test]
fn git_lists_committed_files() {
    let repo = TestRepo::new();
    repo.write(".helm/Chart.yaml", "name: app\n");
    repo.commit_all("Add chart");

    let git = Git::open(repo.path()).unwrap();
    let cancel = Cancellation::new();
    let head = git.head_commit().unwrap();

    assert_eq!(
        git.commit_file_path_list(&cancel, &head).unwrap(),
        vec![".helm/Chart.yaml", "README.md"]
    );
    assert!(git.is_commit_directory_exist(&cancel, &head, ".helm").unwrap());
}

#[cfg(unix)]
mod symlinks {
    use super::*;

    #[test]
    fn symlinked_chart_directory() {
        let repo = TestRepo::new();
        repo.write("charts/app/Chart.yaml", "name: app\n");
        repo.write("charts/app/templates/deployment.yaml", "kind: Deployment\n");
        std::os::unix::fs::symlink("charts/app", repo.path().join(".helm")).unwrap();
        repo.commit_all("Add chart");

        let manager = repo.manager(Mode::Strict);
        let reader = manager.file_reader();
        let cancel = Cancellation::new();

        let dir = reader.locate_chart(&cancel, "").unwrap();
        let files = reader.load_chart_subtree(&cancel, &dir).unwrap();

        assert_eq!(
            files.keys().collect::<Vec<_>>(),
            vec!["Chart.yaml", "templates/deployment.yaml"]
        );
    }

    #[test]
    fn committed_symlink_to_config() {
        let repo = TestRepo::new();
        repo.write("deploy/werf.yaml", "project: linked\n");
        std::os::unix::fs::symlink("deploy/werf.yaml", repo.path().join("werf.yaml")).unwrap();
        repo.commit_all("Add linked config");

        let manager = repo.manager(Mode::Strict);
        let (_, bytes) = manager
            .file_reader()
            .read_config(&Cancellation::new(), "")
            .unwrap();

        assert_eq!(bytes, b"project: linked\n");
    }
}
