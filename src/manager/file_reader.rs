//! manager::file_reader
//!
//! The capability bundle consumed by configuration loaders.
//!
//! Each method fixes the category of the request, so callers cannot mix
//! up which allow-list applies. Paths are project-relative.

use tracing::debug;

use super::read_policy_document;
use crate::core::cancel::Cancellation;
use crate::core::paths;
use crate::core::types::Category;
use crate::errors::GiterminismError;
use crate::inspector::Inspector;
use crate::resolver::{ResolvedFiles, Resolver};

/// Names tried, in order, when no config path is given.
pub const DEFAULT_CONFIG_NAMES: [&str; 2] = ["werf.yaml", "werf.yml"];

/// Suffix of werf config template files.
pub const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Category-bound access to the resolver.
#[derive(Clone, Copy)]
pub struct FileReader<'a> {
    resolver: &'a dyn Resolver,
    inspector: &'a Inspector,
    templates_dir: &'a str,
    chart_dir: &'a str,
}

impl std::fmt::Debug for FileReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader")
            .field("mode", &self.resolver.mode())
            .field("templates_dir", &self.templates_dir)
            .field("chart_dir", &self.chart_dir)
            .finish()
    }
}

impl<'a> FileReader<'a> {
    pub fn new(
        resolver: &'a dyn Resolver,
        inspector: &'a Inspector,
        templates_dir: &'a str,
        chart_dir: &'a str,
    ) -> Self {
        Self {
            resolver,
            inspector,
            templates_dir,
            chart_dir,
        }
    }

    /// Point checks for non-file dependencies.
    pub fn inspector(&self) -> &'a Inspector {
        self.inspector
    }

    // =========================================================================
    // werf config
    // =========================================================================

    pub fn is_config_exist_anywhere(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        self.resolver.is_configuration_file_exist_anywhere(cancel, path)
    }

    /// Read the werf config.
    ///
    /// With an empty `custom_path` the default names are tried in order;
    /// the first one present in either source is read. Returns the path
    /// that was read along with its bytes.
    ///
    /// # Errors
    ///
    /// [`GiterminismError::ConfigNotFound`] if no candidate exists anywhere.
    pub fn read_config(
        &self,
        cancel: &Cancellation,
        custom_path: &str,
    ) -> Result<(String, Vec<u8>), GiterminismError> {
        let candidates: Vec<String> = if custom_path.is_empty() {
            DEFAULT_CONFIG_NAMES.iter().map(|s| s.to_string()).collect()
        } else {
            vec![paths::normalize(custom_path)]
        };

        for candidate in &candidates {
            if self.resolver.is_configuration_file_exist_anywhere(cancel, candidate)? {
                debug!(path = %candidate, "werf config found");
                let bytes = self
                    .resolver
                    .read_configuration_file(cancel, Category::Config, candidate)?;
                return Ok((candidate.clone(), bytes));
            }
        }

        Err(GiterminismError::config_not_found(&candidates))
    }

    /// Call `f` for every `*.tmpl` file below the templates directory.
    ///
    /// `f` receives the path relative to the templates directory. Files are
    /// visited in path order. An empty `custom_dir` means the configured
    /// default.
    pub fn read_config_template_files<F, E>(&self, cancel: &Cancellation, custom_dir: &str, mut f: F) -> Result<(), E>
    where
        F: FnMut(&str, &[u8]) -> Result<(), E>,
        E: From<GiterminismError>,
    {
        let dir = if custom_dir.is_empty() {
            paths::normalize(self.templates_dir)
        } else {
            paths::normalize(custom_dir)
        };

        let pattern = format!("{}{}", paths::subtree_pattern(&dir), TEMPLATE_SUFFIX);
        let files = self
            .resolver
            .files_glob(cancel, Category::ConfigTemplate, &pattern)?;

        for (path, bytes) in &files {
            if let Some(name) = paths::strip_base(&dir, path) {
                f(&name, bytes.as_slice())?;
            }
        }

        Ok(())
    }

    // =========================================================================
    // go-template files
    // =========================================================================

    pub fn config_go_template_files_exists(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        self.resolver
            .is_configuration_file_exist(cancel, Category::ConfigGoTemplateFile, path)
    }

    pub fn config_go_template_files_is_dir(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        self.resolver
            .is_configuration_directory_exist(cancel, Category::ConfigGoTemplateFile, path)
    }

    /// Read one file for `.Files.Get`.
    pub fn config_go_template_files_get(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.resolver
            .check_configuration_file_existence(cancel, Category::ConfigGoTemplateFile, path)?;
        self.resolver
            .read_configuration_file(cancel, Category::ConfigGoTemplateFile, path)
    }

    /// Read every file matching `pattern` for `.Files.Glob`.
    pub fn config_go_template_files_glob(
        &self,
        cancel: &Cancellation,
        pattern: &str,
    ) -> Result<ResolvedFiles, GiterminismError> {
        self.resolver
            .files_glob(cancel, Category::ConfigGoTemplateFile, pattern)
    }

    // =========================================================================
    // Dockerfile
    // =========================================================================

    pub fn read_dockerfile(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.resolver
            .check_configuration_file_existence(cancel, Category::Dockerfile, path)?;
        self.resolver
            .read_configuration_file(cancel, Category::Dockerfile, path)
    }

    pub fn is_dockerignore_exist_anywhere(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        self.resolver.is_configuration_file_exist_anywhere(cancel, path)
    }

    pub fn read_dockerignore(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.resolver
            .check_configuration_file_existence(cancel, Category::Dockerignore, path)?;
        self.resolver
            .read_configuration_file(cancel, Category::Dockerignore, path)
    }

    // =========================================================================
    // giterminism config
    // =========================================================================

    /// Read the policy document; `None` if it exists in neither source.
    pub fn read_giterminism_config(
        &self,
        cancel: &Cancellation,
        path: &str,
    ) -> Result<Option<Vec<u8>>, GiterminismError> {
        read_policy_document(cancel, self.resolver, path)
    }

    // =========================================================================
    // Helm chart
    // =========================================================================

    /// Check that the chart directory may be read and return its
    /// normalized path. An empty `dir` means the configured default.
    pub fn locate_chart(&self, cancel: &Cancellation, dir: &str) -> Result<String, GiterminismError> {
        let dir = if dir.is_empty() {
            paths::normalize(self.chart_dir)
        } else {
            paths::normalize(dir)
        };

        self.resolver
            .check_configuration_directory_existence(cancel, Category::ChartDirectory, &dir)?;
        Ok(dir)
    }

    pub fn chart_is_dir(&self, cancel: &Cancellation, path: &str) -> Result<bool, GiterminismError> {
        self.resolver
            .is_configuration_directory_exist(cancel, Category::ChartDirectory, path)
    }

    pub fn read_chart_file(&self, cancel: &Cancellation, path: &str) -> Result<Vec<u8>, GiterminismError> {
        self.resolver
            .check_configuration_file_existence(cancel, Category::ChartFile, path)?;
        self.resolver
            .read_configuration_file(cancel, Category::ChartFile, path)
    }

    /// Every file of the chart, keyed relative to `dir`.
    pub fn load_chart_subtree(&self, cancel: &Cancellation, dir: &str) -> Result<ResolvedFiles, GiterminismError> {
        self.resolver.load_subtree(cancel, Category::ChartFile, dir)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::core::types::Mode;
    use crate::git::mock::MockRepository;
    use crate::manager::{Manager, ManagerOptions};
    use crate::resolver::ProjectLayout;
    use crate::worktree::mock::MockWorktree;

    fn manager(repo: &MockRepository, wt: &MockWorktree, mode: Mode) -> Manager {
        Manager::new(
            &Cancellation::new(),
            PathBuf::from("/project"),
            ProjectLayout::root(),
            ManagerOptions {
                mode,
                ..Default::default()
            },
            Arc::new(repo.clone()),
            Arc::new(wt.clone()),
        )
        .unwrap()
    }

    mod config {
        use super::*;

        #[test]
        fn default_names_in_order() {
            let repo = MockRepository::new().with_file("werf.yml", "yml");
            let wt = MockWorktree::new().with_file("werf.yml", "yml");
            let m = manager(&repo, &wt, Mode::Strict);

            let (path, bytes) = m.file_reader().read_config(&Cancellation::new(), "").unwrap();
            assert_eq!(path, "werf.yml");
            assert_eq!(bytes, b"yml");
        }

        #[test]
        fn yaml_wins_over_yml() {
            let repo = MockRepository::new()
                .with_file("werf.yaml", "yaml")
                .with_file("werf.yml", "yml");
            let wt = MockWorktree::new();
            let m = manager(&repo, &wt, Mode::Strict);

            let (path, _) = m.file_reader().read_config(&Cancellation::new(), "").unwrap();
            assert_eq!(path, "werf.yaml");
        }

        #[test]
        fn not_found_anywhere() {
            let m = manager(&MockRepository::new(), &MockWorktree::new(), Mode::Strict);

            let err = m.file_reader().read_config(&Cancellation::new(), "").unwrap_err();
            assert!(matches!(err, GiterminismError::ConfigNotFound { .. }));
            assert!(err.to_string().contains("\"werf.yaml\", \"werf.yml\""));
        }

        #[test]
        fn untracked_config_in_strict_mode() {
            let repo = MockRepository::new();
            let wt = MockWorktree::new().with_file("werf.yaml", "a");
            let m = manager(&repo, &wt, Mode::Strict);

            let err = m.file_reader().read_config(&Cancellation::new(), "").unwrap_err();
            assert!(matches!(err, GiterminismError::FilesNotFoundInProjectGitRepository { .. }));
        }

        #[test]
        fn loose_mode_skips_committed_only_candidate() {
            let repo = MockRepository::new().with_file("werf.yaml", "committed");
            let wt = MockWorktree::new().with_file("werf.yml", "local");
            let m = manager(&repo, &wt, Mode::Loose);

            let (path, bytes) = m.file_reader().read_config(&Cancellation::new(), "").unwrap();
            assert_eq!(path, "werf.yml");
            assert_eq!(bytes, b"local");
        }

        #[test]
        fn loose_mode_committed_only_is_not_found() {
            let repo = MockRepository::new().with_file("werf.yaml", "committed");
            let m = manager(&repo, &MockWorktree::new(), Mode::Loose);
            let cancel = Cancellation::new();

            let err = m.file_reader().read_config(&cancel, "").unwrap_err();
            assert!(matches!(err, GiterminismError::ConfigNotFound { .. }));
            assert!(!m.file_reader().is_dockerignore_exist_anywhere(&cancel, "werf.yaml").unwrap());
        }

        #[test]
        fn custom_path() {
            let repo = MockRepository::new().with_file("deploy/werf.yaml", "d");
            let wt = MockWorktree::new();
            let m = manager(&repo, &wt, Mode::Strict);

            let (path, bytes) = m
                .file_reader()
                .read_config(&Cancellation::new(), "./deploy/werf.yaml")
                .unwrap();
            assert_eq!(path, "deploy/werf.yaml");
            assert_eq!(bytes, b"d");
        }
    }

    #[test]
    fn templates_are_relative_to_directory() {
        let repo = MockRepository::new()
            .with_file(".werf/a.tmpl", "a")
            .with_file(".werf/nested/b.tmpl", "b")
            .with_file(".werf/readme.md", "r");
        let wt = MockWorktree::new();
        let m = manager(&repo, &wt, Mode::Strict);

        let mut seen = Vec::new();
        m.file_reader()
            .read_config_template_files(&Cancellation::new(), "", |name, bytes| {
                seen.push((name.to_string(), bytes.to_vec()));
                Ok::<(), GiterminismError>(())
            })
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("a.tmpl".to_string(), b"a".to_vec()),
                ("nested/b.tmpl".to_string(), b"b".to_vec()),
            ]
        );
    }

    #[test]
    fn untracked_template_fails_before_callback() {
        let repo = MockRepository::new().with_file(".werf/a.tmpl", "a");
        let wt = MockWorktree::new().with_file(".werf/b.tmpl", "b");
        let m = manager(&repo, &wt, Mode::Strict);

        let mut calls = 0;
        let err = m
            .file_reader()
            .read_config_template_files(&Cancellation::new(), "", |_, _| {
                calls += 1;
                Ok::<(), GiterminismError>(())
            })
            .unwrap_err();

        assert_eq!(calls, 0);
        assert!(matches!(err, GiterminismError::UncommittedFiles { .. }));
    }

    #[test]
    fn go_template_files() {
        let repo = MockRepository::new().with_file("files/a.txt", "a");
        let wt = MockWorktree::new()
            .with_file("files/a.txt", "a")
            .with_file("files/b.txt", "b");
        let m = manager(&repo, &wt, Mode::Strict);
        let reader = m.file_reader();
        let cancel = Cancellation::new();

        assert!(reader.config_go_template_files_exists(&cancel, "files/a.txt").unwrap());
        assert!(!reader.config_go_template_files_exists(&cancel, "files/b.txt").unwrap());
        assert!(reader.config_go_template_files_is_dir(&cancel, "files").unwrap());
        assert_eq!(reader.config_go_template_files_get(&cancel, "files/a.txt").unwrap(), b"a");
        assert!(matches!(
            reader.config_go_template_files_get(&cancel, "files/b.txt"),
            Err(GiterminismError::UncommittedFiles { .. })
        ));
        assert!(reader.config_go_template_files_glob(&cancel, "files/*").is_err());
    }

    #[test]
    fn dockerfile_and_dockerignore() {
        let repo = MockRepository::new().with_file("Dockerfile", "FROM a\n");
        let wt = MockWorktree::new()
            .with_file("Dockerfile", "FROM a\n")
            .with_file("Dockerfile.dockerignore", "*\n");
        let m = manager(&repo, &wt, Mode::Strict);
        let reader = m.file_reader();
        let cancel = Cancellation::new();

        assert_eq!(reader.read_dockerfile(&cancel, "Dockerfile").unwrap(), b"FROM a\n");
        assert!(reader
            .is_dockerignore_exist_anywhere(&cancel, "Dockerfile.dockerignore")
            .unwrap());
        assert!(matches!(
            reader.read_dockerignore(&cancel, "Dockerfile.dockerignore"),
            Err(GiterminismError::UncommittedFiles { .. })
        ));
    }

    #[test]
    fn chart() {
        let repo = MockRepository::new()
            .with_file(".helm/Chart.yaml", "c")
            .with_file(".helm/values.yaml", "v");
        let wt = MockWorktree::new();
        let m = manager(&repo, &wt, Mode::Strict);
        let reader = m.file_reader();
        let cancel = Cancellation::new();

        assert_eq!(reader.locate_chart(&cancel, "").unwrap(), ".helm");
        assert!(reader.chart_is_dir(&cancel, ".helm").unwrap());
        assert_eq!(reader.read_chart_file(&cancel, ".helm/values.yaml").unwrap(), b"v");
        assert_eq!(reader.load_chart_subtree(&cancel, ".helm").unwrap().len(), 2);
        assert!(reader.locate_chart(&cancel, "charts/missing").is_err());
    }

    #[test]
    fn loose_mode_reads_worktree() {
        let repo = MockRepository::new().with_file(".helm/Chart.yaml", "committed");
        let wt = MockWorktree::new().with_file(".helm/Chart.yaml", "local");
        let m = manager(&repo, &wt, Mode::Loose);

        let bytes = m
            .file_reader()
            .read_chart_file(&Cancellation::new(), ".helm/Chart.yaml")
            .unwrap();
        assert_eq!(bytes, b"local");
        assert!(m.file_reader().inspector().inspect_custom_tags().is_ok());
    }

    #[test]
    fn giterminism_config_absent() {
        let m = manager(&MockRepository::new(), &MockWorktree::new(), Mode::Strict);
        assert!(m
            .file_reader()
            .read_giterminism_config(&Cancellation::new(), "werf-giterminism.yaml")
            .unwrap()
            .is_none());
    }
}
