//! ui
//!
//! User-facing output for the `gtm` binary.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! The library layers never print; they return errors and emit `tracing`
//! events. Only the CLI goes through this module.

pub mod output;
