//! Preflight checks: host tools the pipeline shells out to.

use crate::error::{BuildError, Result};
use crate::models::{BuildConfig, PublishMode};

/// Tools every run needs, as (command, package).
pub const BUILD_TOOLS: &[(&str, &str)] = &[("make", "make")];

/// Tool needed only when publishing.
pub const RELEASE_TOOL: (&str, &str) = ("gh", "github-cli");

/// Check if a command exists on PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Check that specific tools are available.
pub fn check_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .map(|(tool, package)| format!("  {} (install: {})", tool, package))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BuildError::Preflight(format!(
            "Missing required host tools:\n{}",
            missing.join("\n")
        )))
    }
}

/// Tools required for this configuration.
///
/// `gh` is only demanded up front when publishing is unconditional; in `ask`
/// mode a missing `gh` surfaces as a failed release command if the operator
/// says yes.
pub fn required_tools(config: &BuildConfig) -> Vec<(&'static str, &'static str)> {
    let mut tools = BUILD_TOOLS.to_vec();
    if config.publish == PublishMode::Always {
        tools.push(RELEASE_TOOL);
    }
    tools
}

/// Run all host checks for a configuration.
pub fn check_required_tools(config: &BuildConfig) -> Result<()> {
    let tools = required_tools(config);
    log::debug!(
        "[Preflight] Checking host tools: {}",
        tools.iter().map(|(t, _)| *t).collect::<Vec<_>>().join(", ")
    );
    check_tools(&tools)?;
    log::info!("[Preflight] ✓ Host tools present");
    Ok(())
}
