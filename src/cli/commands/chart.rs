//! chart command - List files of a helm chart

use anyhow::{Context as _, Result};

use super::open_manager;
use crate::cli::Context;
use crate::core::cancel::Cancellation;
use crate::ui::output;

/// Locate the chart directory and list its files.
pub fn chart(ctx: &Context, cancel: &Cancellation, dir: Option<&str>) -> Result<()> {
    let manager = open_manager(ctx, cancel)?;
    let reader = manager.file_reader();

    let dir = reader
        .locate_chart(cancel, dir.unwrap_or(""))
        .context("unable to locate chart")?;
    let files = reader
        .load_chart_subtree(cancel, &dir)
        .with_context(|| format!("unable to load chart {:?}", dir))?;

    output::debug(format!("chart {} has {} files", dir, files.len()), ctx.verbosity());

    let paths: Vec<&String> = files.keys().collect();
    if !paths.is_empty() {
        output::print(output::format_list(&paths, ""), ctx.verbosity());
    }

    Ok(())
}
