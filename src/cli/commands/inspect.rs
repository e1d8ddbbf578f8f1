//! inspect command - Check a non-file dependency against the policy

use anyhow::{bail, Result};

use super::open_manager;
use crate::cli::args::InspectCheck;
use crate::cli::Context;
use crate::core::cancel::Cancellation;
use crate::ui::output;

/// Run one inspector check.
pub fn inspect(ctx: &Context, cancel: &Cancellation, check: InspectCheck, value: Option<&str>) -> Result<()> {
    let value = match (check.needs_value(), value) {
        (true, None) => bail!("this check requires a value"),
        (_, value) => value.unwrap_or_default(),
    };

    let manager = open_manager(ctx, cancel)?;
    let inspector = manager.inspector();

    match check {
        InspectCheck::CustomTags => inspector.inspect_custom_tags()?,
        InspectCheck::FromLatest => inspector.inspect_config_stapel_from_latest()?,
        InspectCheck::GitBranch => inspector.inspect_config_stapel_git_branch()?,
        InspectCheck::MountBuildDir => inspector.inspect_config_stapel_mount_build_dir()?,
        InspectCheck::MountFromPath => inspector.inspect_config_stapel_mount_from_path(value)?,
        InspectCheck::ContextAddFile => inspector.inspect_config_dockerfile_context_add_file(value)?,
        InspectCheck::Env => inspector.inspect_config_go_template_rendering_env(value)?,
    }

    output::print("allowed", ctx.verbosity());
    Ok(())
}
