//! Command-line surface of the `fwforge` binary.

use std::path::PathBuf;

use clap::Parser;

use fwforge::{BuildConfig, PublishMode};

#[derive(Parser, Debug)]
#[command(name = "fwforge")]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "Without --config, ~/.config/fwforge/config.toml is used when present."
)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working root that relative paths in the configuration resolve against
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Parallel jobs for download and build (default: logical CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Publish decision after the build: ask, always or never
    #[arg(long, value_name = "MODE")]
    pub publish: Option<PublishMode>,

    /// Publish without prompting (same as --publish always)
    #[arg(short = 'y', long, conflicts_with = "publish")]
    pub yes: bool,

    /// Skip the host tool checks
    #[arg(long)]
    pub skip_preflight: bool,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Fold command-line values over the file/default configuration.
    pub fn apply_overrides(&self, config: &mut BuildConfig) {
        if let Some(jobs) = self.jobs {
            config.jobs = Some(jobs);
        }
        if self.yes {
            config.publish = PublishMode::Always;
        } else if let Some(mode) = self.publish {
            config.publish = mode;
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }
}
