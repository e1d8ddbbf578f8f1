//! policy::matcher
//!
//! The two allow-list flavors.
//!
//! - [`GlobAllowList`]: path globs with directory semantics, for per-file
//!   exceptions.
//! - [`ExactAllowList`]: literal entries compared verbatim, with `/regex/`
//!   entries as an escape hatch, for names that are not paths.
//!
//! Entries are compiled on every match. A malformed entry is an error for
//! the request that hits it, never a silent `false`.

use regex::Regex;

use super::PolicyError;
use crate::core::paths::{self, PathPattern};

/// A list of path globs; any matching entry accepts the path.
#[derive(Debug, Clone, Copy)]
pub struct GlobAllowList<'a> {
    entries: &'a [String],
}

impl<'a> GlobAllowList<'a> {
    pub fn new(entries: &'a [String]) -> Self {
        Self { entries }
    }

    /// Whether any entry matches the path or a directory containing it.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidPattern`] for the first malformed
    /// entry reached before a match.
    pub fn is_matched(&self, path: &str) -> Result<bool, PolicyError> {
        let path = paths::to_slash(path);

        for entry in self.entries {
            let pattern = PathPattern::new(entry).map_err(|e| PolicyError::InvalidPattern {
                pattern: entry.clone(),
                path: path.clone(),
                message: e.to_string(),
            })?;

            if pattern.matches(&path) {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// A list of literal names; `/regex/` entries match the whole name.
#[derive(Debug, Clone, Copy)]
pub struct ExactAllowList<'a> {
    entries: &'a [String],
}

impl<'a> ExactAllowList<'a> {
    pub fn new(entries: &'a [String]) -> Self {
        Self { entries }
    }

    /// Whether any entry accepts the name.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidEnvPattern`] for a `/regex/` entry
    /// that does not compile.
    pub fn is_matched(&self, name: &str) -> Result<bool, PolicyError> {
        for entry in self.entries {
            let matched = match regex_body(entry) {
                Some(body) => {
                    let re = Regex::new(&format!("^{}$", body)).map_err(|e| {
                        PolicyError::InvalidEnvPattern {
                            pattern: entry.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    re.is_match(name)
                }
                None => entry == name,
            };

            if matched {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

fn regex_body(entry: &str) -> Option<&str> {
    if entry.len() >= 2 && entry.starts_with('/') && entry.ends_with('/') {
        Some(&entry[1..entry.len() - 1])
    } else {
        None
    }
}
