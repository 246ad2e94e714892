//! Artifact collection from the build output tree.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Depth of image files below the artifact root: `<target>/<subtarget>/<file>`.
const IMAGE_DEPTH: usize = 3;

/// Matches on the whole file name so multi-part extensions like `img.gz`
/// work.
fn has_wanted_extension(path: &Path, extensions: &[String]) -> bool {
    let name = match path.file_name().and_then(OsStr::to_str) {
        Some(name) => name,
        None => return false,
    };
    extensions.iter().any(|wanted| {
        let ext = wanted.trim_start_matches('.');
        !ext.is_empty()
            && name.len() > ext.len() + 1
            && name.ends_with(ext)
            && name[..name.len() - ext.len()].ends_with('.')
    })
}

fn image_paths(artifact_root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !artifact_root.is_dir() {
        return Ok(found);
    }

    let walker = WalkDir::new(artifact_root)
        .min_depth(IMAGE_DEPTH)
        .max_depth(IMAGE_DEPTH)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            BuildError::io(
                format!("walking {}", artifact_root.display()),
                std::io::Error::from(e),
            )
        })?;
        if entry.file_type().is_file() && has_wanted_extension(entry.path(), extensions) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

/// Find image files under `artifact_root/<target>/<subtarget>/`.
///
/// Keyed by file name, so the result is sorted and a name produced by two
/// subtargets maps to the last one found (with a warning).
pub fn find_artifacts(artifact_root: &Path, extensions: &[String]) -> Result<BTreeMap<String, PathBuf>> {
    if !artifact_root.is_dir() {
        log::warn!(
            "[Collect] Build output directory {} does not exist",
            artifact_root.display()
        );
    }

    let mut found = BTreeMap::new();
    for path in image_paths(artifact_root, extensions)? {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => continue,
        };
        if let Some(previous) = found.insert(name.clone(), path.clone()) {
            log::warn!(
                "[Collect] {} produced more than once; {} replaces {}",
                name,
                path.display(),
                previous.display()
            );
        }
    }

    Ok(found)
}

/// Remove image files left in the build output tree by an earlier run, so
/// the next collection only sees what the upcoming build produces.
pub fn clear_stale_artifacts(artifact_root: &Path, extensions: &[String]) -> Result<usize> {
    let stale = image_paths(artifact_root, extensions)?;
    for path in &stale {
        fs::remove_file(path)
            .map_err(|e| BuildError::io(format!("removing {}", path.display()), e))?;
    }
    if !stale.is_empty() {
        log::info!(
            "[Build] Removed {} image(s) left over from a previous build",
            stale.len()
        );
    }
    Ok(stale.len())
}

/// Copy every image into `output_dir` and return the copied paths, sorted by
/// file name.
///
/// Finding no image at all is fatal: a run that built nothing has nothing to
/// describe or publish.
pub fn collect_artifacts(
    artifact_root: &Path,
    output_dir: &Path,
    extensions: &[String],
) -> Result<Vec<PathBuf>> {
    let found = find_artifacts(artifact_root, extensions)?;
    if found.is_empty() {
        log::error!(
            "[Collect] No files with extension(s) {:?} under {}",
            extensions,
            artifact_root.display()
        );
        return Err(BuildError::NoArtifacts(artifact_root.to_path_buf()));
    }

    let mut copied = Vec::with_capacity(found.len());
    for (name, source) in found {
        let target = output_dir.join(&name);
        fs::copy(&source, &target).map_err(|e| {
            BuildError::io(
                format!("copying {} to {}", source.display(), target.display()),
                e,
            )
        })?;
        log::debug!("[Collect] {} -> {}", source.display(), target.display());
        copied.push(target);
    }

    log::info!(
        "[Collect] Copied {} artifact(s) into {}",
        copied.len(),
        output_dir.display()
    );
    Ok(copied)
}

/// List the output directory for the operator, one line per entry.
pub fn list_output_dir(output_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let entries = fs::read_dir(output_dir)
        .map_err(|e| BuildError::io(format!("listing {}", output_dir.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| BuildError::io(format!("listing {}", output_dir.display()), e))?;
        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        names.push((entry.file_name().to_string_lossy().to_string(), size));
    }
    names.sort();

    log::info!("[Collect] Contents of {}:", output_dir.display());
    for (name, size) in &names {
        log::info!("[Collect]   {:>12}  {}", size, name);
    }
    Ok(names.into_iter().map(|(name, _)| name).collect())
}

/// File names of the collected artifacts, in collection order.
pub fn artifact_names(artifacts: &[PathBuf]) -> Vec<String> {
    artifacts
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect()
}
