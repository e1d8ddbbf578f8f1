//! worktree::fs
//!
//! Filesystem-backed worktree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::{Worktree, WorktreeError};
use crate::core::cancel::Cancellation;
use crate::core::paths::{self, GlobPattern};

/// The project directory on disk.
#[derive(Debug, Clone)]
pub struct FsWorktree {
    /// Canonical project directory
    root: PathBuf,
}

impl FsWorktree {
    /// Open a project directory.
    ///
    /// # Errors
    ///
    /// Returns [`WorktreeError::InvalidRoot`] if the directory cannot be
    /// canonicalized.
    pub fn new(root: &Path) -> Result<Self, WorktreeError> {
        let root = fs::canonicalize(root).map_err(|source| WorktreeError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The canonical project directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Real location of a relative path, if it exists inside the root.
    fn locate(&self, path: &str) -> Result<Option<PathBuf>, WorktreeError> {
        let normalized = paths::normalize(path);
        if paths::escapes_root(&normalized) {
            return Ok(None);
        }

        match fs::canonicalize(self.root.join(&normalized)) {
            Ok(real) if real.starts_with(&self.root) => Ok(Some(real)),
            Ok(real) => {
                debug!(path = %normalized, real = %real.display(), "path resolves outside the project directory");
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(WorktreeError::Io {
                path: normalized,
                source,
            }),
        }
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(paths::to_slash(&rel.to_string_lossy()))
    }
}

impl Worktree for FsWorktree {
    fn read_file(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, WorktreeError> {
        cancel.check()?;

        let not_found = || WorktreeError::NotFound {
            path: paths::normalize(path),
        };

        let real = self.locate(path)?.ok_or_else(not_found)?;
        if !real.is_file() {
            return Err(not_found());
        }

        fs::read(&real).map_err(|source| WorktreeError::Io {
            path: paths::normalize(path),
            source,
        })
    }

    fn is_file(&self, cancel: &Cancellation, path: &str) -> Result<bool, WorktreeError> {
        cancel.check()?;
        Ok(self.locate(path)?.is_some_and(|real| real.is_file()))
    }

    fn is_dir(&self, cancel: &Cancellation, path: &str) -> Result<bool, WorktreeError> {
        cancel.check()?;
        Ok(self.locate(path)?.is_some_and(|real| real.is_dir()))
    }

    fn glob(&self, cancel: &Cancellation, pattern: &str) -> Result<Vec<String>, WorktreeError> {
        cancel.check()?;

        let glob = GlobPattern::new(pattern).map_err(|e| WorktreeError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        let base = glob.literal_prefix();
        if self.locate(&base)?.is_none() {
            return Ok(Vec::new());
        }

        let walker = WalkDir::new(self.root.join(&base))
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");

        let mut files = Vec::new();
        for entry in walker {
            cancel.check()?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let rel = err
                        .path()
                        .and_then(|p| self.relative(p))
                        .unwrap_or_default();

                    if err.loop_ancestor().is_some() {
                        return Err(WorktreeError::SymlinkLoop { path: rel });
                    }
                    if err.io_error().map(|e| e.kind()) == Some(io::ErrorKind::NotFound) {
                        debug!(path = %rel, "skipping broken symlink");
                        continue;
                    }

                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("walk failed"));
                    return Err(WorktreeError::Io { path: rel, source });
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(rel) = self.relative(entry.path()) else {
                continue;
            };
            if !glob.matches(&rel) {
                continue;
            }

            // symlinks may point anywhere; only keep files really inside the root
            if self.locate(&rel)?.is_none() {
                continue;
            }

            files.push(rel);
        }

        files.sort();
        files.dedup();
        debug!(pattern = %pattern, count = files.len(), "globbed project directory");
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(files: &[(&str, &str)]) -> (TempDir, FsWorktree) {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let worktree = FsWorktree::new(dir.path()).unwrap();
        (dir, worktree)
    }

    #[test]
    fn reads_and_probes() {
        let (_dir, wt) = project(&[("werf.yaml", "x"), (".helm/Chart.yaml", "c")]);
        let cancel = Cancellation::new();

        assert_eq!(wt.read_file(&cancel, "werf.yaml").unwrap(), b"x");
        assert!(wt.is_file(&cancel, "werf.yaml").unwrap());
        assert!(!wt.is_file(&cancel, ".helm").unwrap());
        assert!(wt.is_dir(&cancel, ".helm").unwrap());
        assert!(!wt.is_dir(&cancel, "missing").unwrap());
        assert!(matches!(
            wt.read_file(&cancel, "missing"),
            Err(WorktreeError::NotFound { .. })
        ));
        assert!(matches!(
            wt.read_file(&cancel, ".helm"),
            Err(WorktreeError::NotFound { .. })
        ));
    }

    #[test]
    fn parent_escape_is_absent() {
        let (_dir, wt) = project(&[("a", "a")]);
        let cancel = Cancellation::new();
        assert!(!wt.is_file(&cancel, "../a").unwrap());
    }

    #[test]
    fn glob_matches_sorted_files_only() {
        let (_dir, wt) = project(&[
            ("templates/b.tmpl", "b"),
            ("templates/a.tmpl", "a"),
            ("templates/nested/c.tmpl", "c"),
            ("templates/readme.md", "r"),
        ]);
        let cancel = Cancellation::new();

        assert_eq!(
            wt.glob(&cancel, "templates/**/*.tmpl").unwrap(),
            vec!["templates/a.tmpl", "templates/b.tmpl", "templates/nested/c.tmpl"]
        );
        assert_eq!(
            wt.glob(&cancel, "templates/*.tmpl").unwrap(),
            vec!["templates/a.tmpl", "templates/b.tmpl"]
        );
    }

    #[test]
    fn glob_skips_git_directory() {
        let (_dir, wt) = project(&[(".git/config", "x"), ("a.txt", "a")]);
        let cancel = Cancellation::new();
        assert_eq!(wt.glob(&cancel, "**/*").unwrap(), vec!["a.txt"]);
    }

    #[test]
    fn glob_with_missing_base_is_empty() {
        let (_dir, wt) = project(&[("a.txt", "a")]);
        let cancel = Cancellation::new();
        assert!(wt.glob(&cancel, "nothing/**/*").unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let (_dir, wt) = project(&[]);
        let cancel = Cancellation::new();
        assert!(matches!(
            wt.glob(&cancel, "[abc"),
            Err(WorktreeError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn cancelled_glob_fails() {
        let (_dir, wt) = project(&[("a.txt", "a")]);
        let cancel = Cancellation::new();
        cancel.cancel();
        assert!(matches!(
            wt.glob(&cancel, "**/*"),
            Err(WorktreeError::Cancelled)
        ));
    }

    #[cfg(unix)]
    mod symlinks {
        use super::*;
        use std::os::unix::fs::symlink;

        #[test]
        fn glob_follows_directory_links_and_keeps_link_path() {
            let (dir, wt) = project(&[("charts/app/Chart.yaml", "c")]);
            symlink("charts/app", dir.path().join(".helm")).unwrap();
            let cancel = Cancellation::new();

            let files = wt.glob(&cancel, ".helm/**/*").unwrap();
            assert_eq!(files, vec![".helm/Chart.yaml"]);
            assert_eq!(wt.read_file(&cancel, ".helm/Chart.yaml").unwrap(), b"c");
        }

        #[test]
        fn broken_links_are_skipped() {
            let (dir, wt) = project(&[("a.txt", "a")]);
            symlink("missing", dir.path().join("broken")).unwrap();
            let cancel = Cancellation::new();

            assert_eq!(wt.glob(&cancel, "*").unwrap(), vec!["a.txt"]);
            assert!(!wt.is_file(&cancel, "broken").unwrap());
        }

        #[test]
        fn links_leaving_the_project_are_absent() {
            let outside = TempDir::new().unwrap();
            fs::write(outside.path().join("secret"), "s").unwrap();

            let (dir, wt) = project(&[]);
            symlink(outside.path().join("secret"), dir.path().join("secret")).unwrap();
            let cancel = Cancellation::new();

            assert!(!wt.is_file(&cancel, "secret").unwrap());
            assert!(wt.glob(&cancel, "*").unwrap().is_empty());
        }
    }
}
