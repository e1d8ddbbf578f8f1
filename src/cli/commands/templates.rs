//! templates command - List werf config templates

use anyhow::{Context as _, Result};

use super::open_manager;
use crate::cli::Context;
use crate::core::cancel::Cancellation;
use crate::errors::GiterminismError;
use crate::ui::output;

/// List templates with their size, relative to the templates directory.
pub fn templates(ctx: &Context, cancel: &Cancellation, dir: Option<&str>) -> Result<()> {
    let manager = open_manager(ctx, cancel)?;

    let mut lines = Vec::new();
    manager
        .file_reader()
        .read_config_template_files(cancel, dir.unwrap_or(""), |name, bytes| {
            lines.push(format!("{} ({} bytes)", name, bytes.len()));
            Ok::<(), GiterminismError>(())
        })
        .context("unable to read werf config templates")?;

    if !lines.is_empty() {
        output::print(output::format_list(&lines, ""), ctx.verbosity());
    }

    Ok(())
}
