//! glob command - List files matched by a go-template glob

use anyhow::{Context as _, Result};

use super::open_manager;
use crate::cli::Context;
use crate::core::cancel::Cancellation;
use crate::ui::output;

/// List every file the pattern resolves to.
pub fn glob(ctx: &Context, cancel: &Cancellation, pattern: &str) -> Result<()> {
    let manager = open_manager(ctx, cancel)?;

    let files = manager
        .file_reader()
        .config_go_template_files_glob(cancel, pattern)
        .with_context(|| format!("unable to glob files {:?}", pattern))?;

    let paths: Vec<&String> = files.keys().collect();
    if !paths.is_empty() {
        output::print(output::format_list(&paths, ""), ctx.verbosity());
    }

    Ok(())
}
