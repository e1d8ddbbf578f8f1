//! read-config command - Print the resolved werf config

use anyhow::{Context as _, Result};

use super::{open_manager, write_bytes};
use crate::cli::Context;
use crate::core::cancel::Cancellation;
use crate::ui::output;

/// Print the resolved werf config.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Custom config path; falls back to the configured one, then
///   to the default names
pub fn read_config(ctx: &Context, cancel: &Cancellation, path: Option<&str>) -> Result<()> {
    let manager = open_manager(ctx, cancel)?;
    let custom = path.unwrap_or(manager.options().config_path.as_str());

    let (path, bytes) = manager
        .file_reader()
        .read_config(cancel, custom)
        .context("unable to read werf config")?;

    output::debug(format!("resolved {}", path), ctx.verbosity());
    write_bytes(&bytes)
}
