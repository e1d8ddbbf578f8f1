//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the manager for the working directory
//! 2. Issues one request through the file reader or inspector
//! 3. Formats and displays output
//!
//! Handlers never touch the repository or the project directory directly.

mod chart;
mod glob;
mod inspect;
mod policy;
mod read;
mod read_config;
mod templates;

pub use chart::chart;
pub use glob::glob;
pub use inspect::inspect;
pub use policy::policy;
pub use read::read;
pub use read_config::read_config;
pub use templates::templates;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::cancel::Cancellation;
use crate::core::config::Config;
use crate::core::types::Mode;
use crate::git::Git;
use crate::manager::{Manager, ManagerOptions};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    let cancel = Cancellation::new();

    match command {
        Command::ReadConfig { path } => read_config::read_config(ctx, &cancel, path.as_deref()),
        Command::Read { kind, path } => read::read(ctx, &cancel, kind, &path),
        Command::Glob { pattern } => glob::glob(ctx, &cancel, &pattern),
        Command::Templates { dir } => templates::templates(ctx, &cancel, dir.as_deref()),
        Command::Chart { dir } => chart::chart(ctx, &cancel, dir.as_deref()),
        Command::Inspect { check, value } => inspect::inspect(ctx, &cancel, check, value.as_deref()),
        Command::Policy => policy::policy(ctx, &cancel),
    }
}

fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(cwd) => Ok(cwd.clone()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

/// Open the manager for the working directory, applying flag overrides
/// on top of the layered configuration.
pub(crate) fn open_manager(ctx: &Context, cancel: &Cancellation) -> Result<Manager> {
    let cwd = working_dir(ctx)?;
    let git = Git::open(&cwd).context("Failed to open repository")?;

    let config = Config::load(Some(git.git_dir()))
        .context("Failed to load config")?
        .config;

    let mut options = ManagerOptions::from_config(&config);
    if ctx.loose {
        options.mode = Mode::Loose;
    }
    if let Some(policy_file) = &ctx.policy_file {
        options.policy_file = policy_file.clone();
    }

    let manager = Manager::from_git(cancel, git, &cwd, options).context("Failed to initialize giterminism")?;

    if manager.mode().is_loose() {
        output::warn(
            "loose giterminism is enabled: project directory files are used without checks",
            ctx.verbosity(),
        );
    }
    output::debug(
        format!(
            "project {} at commit {} ({} mode)",
            manager.project_dir().display(),
            manager.head_commit().short(12),
            manager.mode()
        ),
        ctx.verbosity(),
    );

    Ok(manager)
}

/// Write raw file content to stdout.
pub(crate) fn write_bytes(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes).context("Failed to write output")?;
    stdout.flush().context("Failed to write output")?;
    Ok(())
}
