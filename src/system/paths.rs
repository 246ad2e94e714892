/// Workspace path resolution.
///
/// Every location the pipeline touches is derived here from the working root
/// and the run's `BuildConfig`, so steps never join paths ad hoc.

use std::path::{Component, Path, PathBuf};

use crate::error::ConfigError;
use crate::models::BuildConfig;

/// Name of the release metadata record inside the output directory.
pub const RELEASE_INFO_FILENAME: &str = "release-info.txt";

/// Feed configuration file inside the source tree.
pub const FEEDS_CONF_FILENAME: &str = "feeds.conf.default";

/// Resolved, absolute-or-root-relative locations for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspacePaths {
    /// Working root all relative config paths are resolved against
    pub root: PathBuf,
    /// Source checkout
    pub source_dir: PathBuf,
    /// Output directory (wiped every run)
    pub output_dir: PathBuf,
    /// Log directory
    pub log_dir: PathBuf,
    /// Diff-config overlay supplied by the operator
    pub diffconfig: PathBuf,
    /// Directory holding `<target>/<subtarget>/` image directories
    pub artifact_root: PathBuf,
}

impl WorkspacePaths {
    pub fn resolve(root: &Path, config: &BuildConfig) -> Self {
        let source_dir = resolve_path(root, &config.source_dir);
        WorkspacePaths {
            root: normalize(root),
            artifact_root: source_dir.join(&config.artifact_subdir),
            source_dir,
            output_dir: resolve_path(root, &config.output_dir),
            log_dir: resolve_path(root, &config.log_dir),
            diffconfig: resolve_path(root, &config.diffconfig),
        }
    }

    /// Refuse layouts where wiping the output directory would destroy the
    /// working root, the source tree or the logs.
    pub fn ensure_safe_layout(&self) -> Result<(), ConfigError> {
        let output = &self.output_dir;
        let guarded = [
            ("working root", &self.root),
            ("source directory", &self.source_dir),
            ("log directory", &self.log_dir),
        ];

        for (label, path) in guarded {
            if path.starts_with(output) {
                return Err(ConfigError::ValidationFailed(format!(
                    "output directory {} would contain the {} {}",
                    output.display(),
                    label,
                    path.display()
                )));
            }
        }

        if self.diffconfig.starts_with(output) {
            return Err(ConfigError::ValidationFailed(format!(
                "diff-config {} lives inside the output directory {}",
                self.diffconfig.display(),
                output.display()
            )));
        }

        Ok(())
    }

    pub fn feeds_conf(&self) -> PathBuf {
        self.source_dir.join(FEEDS_CONF_FILENAME)
    }

    pub fn feeds_script(&self) -> PathBuf {
        self.source_dir.join("scripts").join("feeds")
    }

    /// Checkout of a registered feed, created by the feed update step.
    pub fn feed_repo_dir(&self, feed_name: &str) -> PathBuf {
        self.source_dir.join("feeds").join(feed_name)
    }

    /// Active configuration the build system reads.
    pub fn active_config(&self) -> PathBuf {
        self.source_dir.join(".config")
    }

    pub fn release_info(&self) -> PathBuf {
        self.output_dir.join(RELEASE_INFO_FILENAME)
    }
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&root.join(path))
    }
}

/// Fold `.` and `..` lexically so containment checks compare real locations.
/// `..` never climbs above the filesystem root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
