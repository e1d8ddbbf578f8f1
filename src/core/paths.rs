//! core::paths
//!
//! Relative path normalization and glob matching.
//!
//! # Conventions
//!
//! Every path that crosses a module boundary is a project-relative path
//! in normalized form:
//! - forward slashes only
//! - no leading `./`, no empty or `.` components, no trailing `/`
//! - `..` components collapsed where possible
//!
//! The empty string denotes the project root.
//!
//! # Matching
//!
//! [`PathPattern`] matches a path if the path matches the pattern itself
//! or `pattern/**/*`, so a pattern naming a directory accepts everything
//! below it. `*` and `?` never cross a `/`; `**` as a whole component
//! matches any number of directories.
//!
//! # Example
//!
//! ```
//! use giterminism::core::paths::{normalize, PathPattern};
//!
//! assert_eq!(normalize("./templates//a.tmpl"), "templates/a.tmpl");
//!
//! let pattern = PathPattern::new("templates/**/*.tmpl").unwrap();
//! assert!(pattern.matches("templates/a.tmpl"));
//! assert!(pattern.matches("templates/nested/b.tmpl"));
//! assert!(!pattern.matches("other/a.tmpl"));
//!
//! let dir = PathPattern::new(".helm").unwrap();
//! assert!(dir.matches(".helm/templates/deployment.yaml"));
//! ```

use glob::{MatchOptions, Pattern, PatternError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Convert platform separators to forward slashes.
pub fn to_slash(path: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Normalize a relative path (see module docs).
///
/// Leading `..` components that cannot be collapsed are kept, so a path
/// escaping the root stays recognizable via [`escapes_root`].
pub fn normalize(path: &str) -> String {
    let slashed = to_slash(path);
    let mut parts: Vec<&str> = Vec::new();
    for part in slashed.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Join two relative paths and normalize the result.
pub fn join(base: &str, rel: &str) -> String {
    if base.is_empty() {
        normalize(rel)
    } else if rel.is_empty() {
        normalize(base)
    } else {
        normalize(&format!("{}/{}", base, rel))
    }
}

/// Parent directory of a normalized path (`""` for top-level entries).
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Whether the normalized path points outside its root.
pub fn escapes_root(path: &str) -> bool {
    path == ".." || path.starts_with("../")
}

/// Whether `path` equals `base` or lies below it.
///
/// An empty `base` contains everything.
pub fn is_subpath(base: &str, path: &str) -> bool {
    base.is_empty()
        || path == base
        || (path.len() > base.len() && path.starts_with(base) && path.as_bytes()[base.len()] == b'/')
}

/// Strip `base` from `path`, returning the remainder relative to `base`.
///
/// Returns `None` if `path` is not below `base`.
pub fn strip_base(base: &str, path: &str) -> Option<String> {
    if base.is_empty() {
        return Some(path.to_string());
    }
    if path == base {
        return Some(String::new());
    }
    if is_subpath(base, path) {
        return Some(path[base.len() + 1..].to_string());
    }
    None
}

/// Whether a path component contains glob metacharacters.
pub fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Longest leading run of literal directory components of a pattern.
///
/// The last component is never included because a literal last
/// component may name either a file or a directory.
pub fn literal_prefix(pattern: &str) -> String {
    let normalized = normalize(pattern);
    let components: Vec<&str> = normalized.split('/').collect();
    let mut prefix = Vec::new();
    for component in &components[..components.len().saturating_sub(1)] {
        if has_glob_meta(component) {
            break;
        }
        prefix.push(*component);
    }
    prefix.join("/")
}

/// Glob matching every file below `dir`, with `dir` itself escaped.
pub fn subtree_pattern(dir: &str) -> String {
    let dir = normalize(dir);
    if dir.is_empty() {
        "**/*".to_string()
    } else {
        format!("{}/**/*", Pattern::escape(&dir))
    }
}

/// A compiled path glob with directory semantics.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    exact: Pattern,
    below: Pattern,
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// A trailing `/` is ignored, so `.helm/` and `.helm` are the same
    /// rule. A leading `/` is kept; absolute entries only match absolute
    /// paths.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`PatternError`] for malformed patterns
    /// (unclosed character classes, `**` not forming a whole component).
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let trimmed = to_slash(pattern).trim_end_matches('/').to_string();
        let below_raw = if trimmed.is_empty() {
            "**/*".to_string()
        } else {
            format!("{}/**/*", trimmed)
        };

        Ok(Self {
            exact: Pattern::new(&trimmed)?,
            below: Pattern::new(&below_raw)?,
            raw: pattern.to_string(),
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a normalized relative path.
    pub fn matches(&self, path: &str) -> bool {
        let path = to_slash(path);
        self.exact.matches_with(&path, MATCH_OPTIONS) || self.below.matches_with(&path, MATCH_OPTIONS)
    }
}

/// A compiled file glob.
///
/// Unlike [`PathPattern`] there is no directory rule: `templates/*`
/// matches `templates/a` but not `templates/x/a`.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    normalized: String,
    pattern: Pattern,
}

impl GlobPattern {
    /// Compile a glob over normalized relative paths.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`PatternError`] for malformed patterns.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let normalized = normalize(pattern);
        Ok(Self {
            pattern: Pattern::new(&normalized)?,
            normalized,
            raw: pattern.to_string(),
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Directory below which every match lives (see [`literal_prefix`]).
    pub fn literal_prefix(&self) -> String {
        literal_prefix(&self.normalized)
    }

    /// Match a normalized relative path.
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(&to_slash(path), MATCH_OPTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod normalize {
        use super::*;

        #[test]
        fn strips_dot_and_empty_components() {
            assert_eq!(normalize("./a//b/./c/"), "a/b/c");
            assert_eq!(normalize(""), "");
            assert_eq!(normalize("."), "");
        }

        #[test]
        fn collapses_parent_components() {
            assert_eq!(normalize("a/b/../c"), "a/c");
            assert_eq!(normalize("a/../../c"), "../c");
            assert_eq!(normalize("../../x"), "../../x");
        }

        #[test]
        fn join_handles_empty_sides() {
            assert_eq!(join("", "werf.yaml"), "werf.yaml");
            assert_eq!(join("dir", ""), "dir");
            assert_eq!(join("dir/sub", "../a"), "dir/a");
        }
    }

    mod subpaths {
        use super::*;

        #[test]
        fn is_subpath_respects_component_boundaries() {
            assert!(is_subpath("", "anything"));
            assert!(is_subpath(".helm", ".helm"));
            assert!(is_subpath(".helm", ".helm/Chart.yaml"));
            assert!(!is_subpath(".helm", ".helmfile"));
        }

        #[test]
        fn strip_base_returns_remainder() {
            assert_eq!(strip_base(".werf", ".werf/a.tmpl"), Some("a.tmpl".into()));
            assert_eq!(strip_base(".werf", ".werf"), Some(String::new()));
            assert_eq!(strip_base(".werf", "werf.yaml"), None);
            assert_eq!(strip_base("", "werf.yaml"), Some("werf.yaml".into()));
        }

        #[test]
        fn parent_of_top_level_is_root() {
            assert_eq!(parent("werf.yaml"), "");
            assert_eq!(parent("a/b/c"), "a/b");
        }

        #[test]
        fn subtree_pattern_escapes_dir() {
            assert_eq!(subtree_pattern(""), "**/*");
            assert_eq!(subtree_pattern("./.helm/"), ".helm/**/*");
            assert_eq!(subtree_pattern("a[1]"), "a[[]1[]]/**/*");
        }

        #[test]
        fn escaping_paths_detected() {
            assert!(escapes_root(".."));
            assert!(escapes_root("../a"));
            assert!(!escapes_root("..a"));
        }
    }

    mod literal_prefix {
        use super::*;

        #[test]
        fn stops_at_first_meta_component() {
            assert_eq!(literal_prefix("templates/**/*.tmpl"), "templates");
            assert_eq!(literal_prefix("a/b/c?/d"), "a/b");
        }

        #[test]
        fn never_includes_last_component() {
            assert_eq!(literal_prefix("werf.yaml"), "");
            assert_eq!(literal_prefix(".helm/templates"), ".helm");
        }
    }

    mod pattern {
        use super::*;

        #[test]
        fn star_does_not_cross_separator() {
            let p = PathPattern::new(".werf/*").unwrap();
            assert!(p.matches(".werf/file1"));
            // matched through the directory rule of ".werf/*"
            assert!(p.matches(".werf/dir/file"));
            let p = PathPattern::new("*.tmpl").unwrap();
            assert!(p.matches("a.tmpl"));
            assert!(!p.matches("dir/a.tmpl"));
        }

        #[test]
        fn double_star_matches_zero_or_more_dirs() {
            let p = PathPattern::new("templates/**/*.tmpl").unwrap();
            assert!(p.matches("templates/a.tmpl"));
            assert!(p.matches("templates/x/y/a.tmpl"));
            assert!(!p.matches("templates/a.yaml"));
        }

        #[test]
        fn directory_pattern_accepts_children() {
            let p = PathPattern::new(".werf").unwrap();
            assert!(p.matches(".werf"));
            assert!(p.matches(".werf/a/b"));
            assert!(!p.matches(".werfx/a"));
        }

        #[test]
        fn trailing_slash_is_ignored() {
            let p = PathPattern::new(".werf/").unwrap();
            assert!(p.matches(".werf"));
            assert!(p.matches(".werf/file1"));
        }

        #[test]
        fn absolute_entries_match_absolute_paths() {
            let p = PathPattern::new("/cache").unwrap();
            assert!(p.matches("/cache"));
            assert!(p.matches("/cache/go/pkg"));
            assert!(!p.matches("cache"));
        }

        #[test]
        fn character_classes_and_question_mark() {
            let p = PathPattern::new("file[12]?.txt").unwrap();
            assert!(p.matches("file1a.txt"));
            assert!(!p.matches("file3a.txt"));
        }

        #[test]
        fn malformed_pattern_is_an_error() {
            assert!(PathPattern::new("[abc").is_err());
            assert!(PathPattern::new("a**/b").is_err());
        }
    }

    mod glob_pattern {
        use super::*;

        #[test]
        fn no_directory_rule() {
            let g = GlobPattern::new("templates/*").unwrap();
            assert!(g.matches("templates/a"));
            assert!(!g.matches("templates/x/a"));
            assert_eq!(g.literal_prefix(), "templates");
        }

        #[test]
        fn pattern_is_normalized() {
            let g = GlobPattern::new("./templates//**/*.tmpl").unwrap();
            assert!(g.matches("templates/a.tmpl"));
            assert!(g.matches("templates/x/a.tmpl"));
            assert_eq!(g.as_str(), "./templates//**/*.tmpl");
        }
    }
}
