//! Diff-config application.
//!
//! The diff-config only lists options that differ from the build system's
//! defaults. It is copied into the source tree as the active `.config` and
//! expanded there by `make defconfig`.

use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};
use crate::system::{CommandRunner, CommandSpec, WorkspacePaths};

/// Fail with `MissingDiffConfig` unless `path` is an existing file.
pub fn require_diffconfig(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        log::error!("[Config] Diff-config not found at {}", path.display());
        Err(BuildError::MissingDiffConfig(path.to_path_buf()))
    }
}

/// Check, copy and expand the diff-config.
///
/// Nothing is written into the source tree when the diff-config is missing.
pub fn apply_diffconfig(runner: &dyn CommandRunner, paths: &WorkspacePaths) -> Result<()> {
    require_diffconfig(&paths.diffconfig)?;

    let target = paths.active_config();
    fs::copy(&paths.diffconfig, &target).map_err(|e| {
        BuildError::io(
            format!(
                "copying {} to {}",
                paths.diffconfig.display(),
                target.display()
            ),
            e,
        )
    })?;
    log::info!(
        "[Config] Copied {} to {}",
        paths.diffconfig.display(),
        target.display()
    );

    runner.run(
        &CommandSpec::new("make")
            .arg("defconfig")
            .current_dir(&paths.source_dir),
    )
}
