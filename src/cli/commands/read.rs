//! read command - Print a single resolved file

use anyhow::{Context as _, Result};

use super::{open_manager, write_bytes};
use crate::cli::args::ReadKind;
use crate::cli::Context;
use crate::core::cancel::Cancellation;

/// Print a single file, resolved with the allow-list of its kind.
pub fn read(ctx: &Context, cancel: &Cancellation, kind: ReadKind, path: &str) -> Result<()> {
    let manager = open_manager(ctx, cancel)?;
    let reader = manager.file_reader();

    let bytes = match kind {
        ReadKind::Dockerfile => reader
            .read_dockerfile(cancel, path)
            .context("unable to read dockerfile")?,
        ReadKind::Dockerignore => reader
            .read_dockerignore(cancel, path)
            .context("unable to read dockerignore file")?,
        ReadKind::File => reader
            .config_go_template_files_get(cancel, path)
            .with_context(|| format!("unable to read file {:?}", path))?,
        ReadKind::ChartFile => reader
            .read_chart_file(cancel, path)
            .context("unable to read chart file")?,
    };

    write_bytes(&bytes)
}
