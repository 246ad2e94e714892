//! Release publishing through the `gh` CLI.
//!
//! One `gh release create` call creates the tag, uploads every artifact and
//! sets the notes from the release-info file. Nothing is retried.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::Result;
use crate::models::{BuildConfig, PublishMode};
use crate::system::{prompt_yes_no, CommandRunner, CommandSpec};

pub const RELEASE_PROMPT: &str = "Publish release to GitHub?";

/// `<prefix><YYYYmmdd-HHMMSS>` for the given instant.
pub fn release_tag<Tz: TimeZone>(prefix: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}", prefix, now.format("%Y%m%d-%H%M%S"))
}

/// Decide whether to publish, prompting the operator in `ask` mode.
pub fn should_publish(
    mode: PublishMode,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<bool> {
    match mode {
        PublishMode::Always => {
            log::info!("[Publish] Publish mode is 'always', not prompting");
            Ok(true)
        }
        PublishMode::Never => {
            log::info!("[Publish] Publish mode is 'never', not prompting");
            Ok(false)
        }
        PublishMode::Ask => {
            // Queued log lines must reach the console before the question does
            log::logger().flush();
            prompt_yes_no(input, output, RELEASE_PROMPT)
        }
    }
}

/// The `gh release create` invocation for one release.
pub fn release_command(
    config: &BuildConfig,
    tag: &str,
    artifacts: &[PathBuf],
    notes_file: &Path,
) -> CommandSpec {
    let mut spec = CommandSpec::new("gh").args(["release", "create", tag]);
    for artifact in artifacts {
        spec = spec.arg(artifact.to_string_lossy());
    }
    spec = spec
        .args(["--title", tag, "--notes-file"])
        .arg(notes_file.to_string_lossy());
    if let Some(repo) = &config.release_repo {
        spec = spec.args(["--repo", repo.as_str()]);
    }
    spec
}

/// Create the release. Exactly one external call is made.
pub fn publish_release(
    runner: &dyn CommandRunner,
    config: &BuildConfig,
    tag: &str,
    artifacts: &[PathBuf],
    notes_file: &Path,
) -> Result<()> {
    log::info!(
        "[Publish] Creating release {} with {} artifact(s)",
        tag,
        artifacts.len()
    );
    runner.run(&release_command(config, tag, artifacts, notes_file))?;
    log::info!("[Publish] Release {} created", tag);
    Ok(())
}
