//! policy command - Print the effective policy as JSON

use anyhow::{Context as _, Result};
use serde_json::json;

use super::open_manager;
use crate::cli::Context;
use crate::core::cancel::Cancellation;

/// Print mode, head commit and the policy document.
///
/// Always printed, even with `--quiet`, since the JSON is the result.
pub fn policy(ctx: &Context, cancel: &Cancellation) -> Result<()> {
    let manager = open_manager(ctx, cancel)?;

    let value = json!({
        "mode": manager.mode(),
        "headCommit": manager.head_commit().as_str(),
        "policyFile": manager.options().policy_file,
        "policy": manager.policy().document(),
    });

    let rendered = serde_json::to_string_pretty(&value).context("Failed to serialize policy")?;
    println!("{}", rendered);
    Ok(())
}
