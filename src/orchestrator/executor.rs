//! Build execution: source download and the parallel firmware build.
//!
//! Both steps hand the worker count to `make` and block until it exits.
//! Scheduling and dependency resolution belong entirely to the build system.

use crate::error::Result;
use crate::models::BuildConfig;
use crate::system::{CommandRunner, CommandSpec, WorkspacePaths};

/// `-j<n>` argument for the configured worker count.
pub fn jobs_arg(config: &BuildConfig) -> String {
    format!("-j{}", config.job_count())
}

/// `make download -j<n>` in the source tree.
pub fn download_command(config: &BuildConfig, paths: &WorkspacePaths) -> CommandSpec {
    CommandSpec::new("make")
        .arg("download")
        .arg(jobs_arg(config))
        .current_dir(&paths.source_dir)
}

/// `make -j<n> [V=s]` in the source tree.
pub fn build_command(config: &BuildConfig, paths: &WorkspacePaths) -> CommandSpec {
    let spec = CommandSpec::new("make")
        .arg(jobs_arg(config))
        .current_dir(&paths.source_dir);
    if config.verbose_build {
        spec.arg("V=s")
    } else {
        spec
    }
}

/// Fetch every upstream source archive the configuration references.
pub fn download_sources(
    runner: &dyn CommandRunner,
    config: &BuildConfig,
    paths: &WorkspacePaths,
) -> Result<()> {
    runner.run(&download_command(config, paths))
}

/// Compile firmware images with the configured worker count.
pub fn build_firmware(
    runner: &dyn CommandRunner,
    config: &BuildConfig,
    paths: &WorkspacePaths,
) -> Result<()> {
    log::info!("[Build] Starting build with {} parallel jobs", config.job_count());
    runner.run(&build_command(config, paths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn config_with_jobs(jobs: Option<usize>) -> BuildConfig {
        BuildConfig {
            jobs,
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_build_command_verbose() {
        let config = config_with_jobs(Some(12));
        let paths = WorkspacePaths::resolve(Path::new("/work"), &config);

        let spec = build_command(&config, &paths);
        assert_eq!(spec.program_name(), "make");
        assert_eq!(spec.args, vec!["-j12", "V=s"]);
        assert_eq!(spec.cwd.as_deref(), Some(Path::new("/work/openwrt")));
    }

    #[test]
    fn test_build_command_quiet() {
        let config = BuildConfig {
            verbose_build: false,
            ..config_with_jobs(Some(2))
        };
        let paths = WorkspacePaths::resolve(Path::new("/work"), &config);
        assert_eq!(build_command(&config, &paths).args, vec!["-j2"]);
    }

    #[test]
    fn test_download_command() {
        let config = config_with_jobs(Some(4));
        let paths = WorkspacePaths::resolve(Path::new("/work"), &config);
        assert_eq!(download_command(&config, &paths).args, vec!["download", "-j4"]);
    }

    #[test]
    fn test_default_jobs_follow_cpu_count() {
        let config = config_with_jobs(None);
        assert_eq!(jobs_arg(&config), format!("-j{}", num_cpus::get().max(1)));
    }
}
