//! core
//!
//! Core domain types shared by every layer.
//!
//! # Modules
//!
//! - [`types`] - Strong types: CommitId, Mode, Category
//! - [`paths`] - Relative path normalization and glob matching
//! - [`config`] - Tool configuration schema and loading
//! - [`cancel`] - Cooperative cancellation
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Paths are normalized once, at the boundary
//! - Nothing here performs repository or worktree I/O

pub mod cancel;
pub mod config;
pub mod paths;
pub mod types;
