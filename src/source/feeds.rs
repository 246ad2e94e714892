//! Feed registration.
//!
//! Adds the custom feed declaration to the source tree's feed configuration
//! exactly once, then hands off to the tree's own feed script to refresh the
//! feed index and install every declared package.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{BuildError, Result};
use crate::system::{CommandRunner, CommandSpec, WorkspacePaths};

/// Append `line` to the file at `path` unless an identical line is already
/// present. Returns true when the line was appended.
///
/// Matching is whole-line and exact (after stripping the line terminator), so
/// a commented-out copy or a declaration with a different URL does not count.
/// The file is created when missing.
pub fn ensure_feed_line(path: &Path, line: &str) -> Result<bool> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(BuildError::io(
                format!("reading feed configuration {}", path.display()),
                e,
            ))
        }
    };

    if existing.lines().any(|candidate| candidate.trim_end_matches('\r') == line) {
        log::info!("[Feeds] Feed line already registered in {}", path.display());
        return Ok(false);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| BuildError::io(format!("opening {}", path.display()), e))?;

    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    writeln!(file, "{}{}", separator, line)
        .map_err(|e| BuildError::io(format!("appending to {}", path.display()), e))?;

    log::info!("[Feeds] Registered feed line in {}: {}", path.display(), line);
    Ok(true)
}

/// Register the feed line, then update and install all feeds.
pub fn register_feeds(
    runner: &dyn CommandRunner,
    paths: &WorkspacePaths,
    feed_line: &str,
) -> Result<()> {
    ensure_feed_line(&paths.feeds_conf(), feed_line)?;

    for action in ["update", "install"] {
        let spec = CommandSpec::new(paths.feeds_script())
            .args([action, "-a"])
            .current_dir(&paths.source_dir);
        runner.run(&spec)?;
    }
    Ok(())
}
