//! Integration tests for the gtm binary.

use std::path::Path;
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A committed project plus an isolated home directory.
struct Project {
    dir: TempDir,
    home: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");

        run_git(dir.path(), &["init", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        let project = Self { dir, home };
        project.write("werf.yaml", "project: demo\n");
        project.write(".werf/a.tmpl", "a\n");
        project.write(".helm/Chart.yaml", "name: demo\n");
        project.commit_all("Initial commit");
        project
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, path: &str, content: &str) {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    fn commit_all(&self, message: &str) {
        run_git(self.path(), &["add", "-A"]);
        run_git(self.path(), &["commit", "-m", message]);
    }

    fn gtm(&self) -> Command {
        let mut cmd = Command::cargo_bin("gtm").unwrap();
        cmd.arg("--cwd")
            .arg(self.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .env_remove("GITERMINISM_CONFIG")
            .env_remove("GITERMINISM_LOG")
            .env_remove("WERF_LOOSE_GITERMINISM");
        cmd
    }
}

fn run_git(dir: &Path, args: &[&str]) {
    let output = StdCommand::new("git")
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

#[test]
fn read_config_prints_committed_content() {
    let project = Project::new();

    project
        .gtm()
        .arg("read-config")
        .assert()
        .success()
        .stdout("project: demo\n");
}

#[test]
fn read_config_fails_on_changes() {
    let project = Project::new();
    project.write("werf.yaml", "project: changed\n");

    project
        .gtm()
        .arg("read-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "the werf config \"werf.yaml\" changes must be committed",
        ));
}

#[test]
fn loose_flag_reads_worktree() {
    let project = Project::new();
    project.write("werf.yaml", "project: changed\n");

    project
        .gtm()
        .args(["--loose-giterminism", "read-config"])
        .assert()
        .success()
        .stdout("project: changed\n")
        .stderr(predicate::str::contains("loose giterminism is enabled"));
}

#[test]
fn loose_env_var_reads_worktree() {
    let project = Project::new();
    project.write("werf.yaml", "project: changed\n");

    project
        .gtm()
        .env("WERF_LOOSE_GITERMINISM", "1")
        .arg("read-config")
        .assert()
        .success()
        .stdout("project: changed\n");
}

#[test]
fn templates_lists_names() {
    let project = Project::new();

    project
        .gtm()
        .arg("templates")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.tmpl (2 bytes)"));
}

#[test]
fn templates_reports_untracked() {
    let project = Project::new();
    project.write(".werf/b.tmpl", "b\n");

    project
        .gtm()
        .arg("templates")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".werf/b.tmpl"));
}

#[test]
fn chart_lists_files() {
    let project = Project::new();

    project
        .gtm()
        .arg("chart")
        .assert()
        .success()
        .stdout(predicate::str::contains("Chart.yaml"));
}

#[test]
fn inspect_denies_without_policy() {
    let project = Project::new();

    project
        .gtm()
        .args(["inspect", "env", "HOME"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "env name \"HOME\" not allowed by giterminism",
        ));
}

#[test]
fn inspect_requires_value() {
    let project = Project::new();

    project
        .gtm()
        .args(["inspect", "context-add-file"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a value"));
}

#[test]
fn committed_policy_is_printed() {
    let project = Project::new();
    project.write(
        "werf-giterminism.yaml",
        "giterminismConfigVersion: 1\ncli:\n  allowCustomTags: true\n",
    );
    project.commit_all("Add policy");

    project
        .gtm()
        .arg("policy")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"allowCustomTags\": true"))
        .stdout(predicate::str::contains("\"mode\": \"strict\""));

    project
        .gtm()
        .args(["inspect", "custom-tags"])
        .assert()
        .success()
        .stdout("allowed\n");
}

#[test]
fn outside_repository_fails() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("gtm")
        .unwrap()
        .arg("--cwd")
        .arg(dir.path())
        .arg("read-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open repository"));
}
