//! Stage 1: Preparation - output directory reset.
//!
//! The output directory is emptied at the start of every run so that, after
//! a successful run, it holds only what that run produced.

use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Delete everything inside `output_dir` if it exists, otherwise create it.
///
/// The directory itself is kept so that anything holding its path (a shell,
/// a file manager) stays valid. A non-directory at that path is an error.
pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)
            .map_err(|e| BuildError::io(format!("creating {}", output_dir.display()), e))?;
        log::info!("[Prepare] Created output directory {}", output_dir.display());
        return Ok(());
    }

    if !output_dir.is_dir() {
        return Err(BuildError::io(
            format!("preparing {}", output_dir.display()),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "path exists but is not a directory",
            ),
        ));
    }

    let entries = fs::read_dir(output_dir)
        .map_err(|e| BuildError::io(format!("listing {}", output_dir.display()), e))?;

    let mut removed = 0usize;
    for entry in entries {
        let entry =
            entry.map_err(|e| BuildError::io(format!("listing {}", output_dir.display()), e))?;
        let path = entry.path();
        // file_type() does not follow symlinks, so a link to a directory is
        // removed as a link rather than recursed into
        let is_dir = entry
            .file_type()
            .map(|t| t.is_dir())
            .map_err(|e| BuildError::io(format!("inspecting {}", path.display()), e))?;

        let result = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| BuildError::io(format!("removing {}", path.display()), e))?;
        removed += 1;
    }

    log::info!(
        "[Prepare] Cleared {} entr{} from {}",
        removed,
        if removed == 1 { "y" } else { "ies" },
        output_dir.display()
    );
    Ok(())
}
