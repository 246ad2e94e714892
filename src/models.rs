//! Core data types for fwforge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do at the publish decision point after metadata is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Ask the operator on stdin.
    #[default]
    Ask,
    /// Publish without prompting.
    Always,
    /// Never publish, never prompt.
    Never,
}

impl PublishMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishMode::Ask => "ask",
            PublishMode::Always => "always",
            PublishMode::Never => "never",
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ask" => Ok(PublishMode::Ask),
            "always" | "yes" => Ok(PublishMode::Always),
            "never" | "no" => Ok(PublishMode::Never),
            other => Err(format!(
                "unknown publish mode '{}' (expected ask, always or never)",
                other
            )),
        }
    }
}

/// Build configuration for a single run.
///
/// Constructed once before the pipeline starts and passed by reference to
/// every step; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Firmware source repository
    pub source_url: String,
    /// Release branch (or tag) to build
    pub source_branch: String,
    /// Name the custom feed is registered under
    pub feed_name: String,
    /// Custom feed repository
    pub feed_url: String,
    /// Explicit feed declaration line; derived from name and URL when unset
    pub feed_line: Option<String>,
    /// Diff-config overlay, relative to the working root
    pub diffconfig: PathBuf,
    /// Source checkout directory
    pub source_dir: PathBuf,
    /// Output directory, wiped on every run
    pub output_dir: PathBuf,
    /// Log directory (must not live inside the output directory)
    pub log_dir: PathBuf,
    /// Build-output subpath holding `<target>/<subtarget>/` image directories
    pub artifact_subdir: PathBuf,
    /// File extensions that count as firmware images
    pub artifact_extensions: Vec<String>,
    /// Worker count override; defaults to the number of logical CPUs
    pub jobs: Option<usize>,
    /// Pass `V=s` to the build
    pub verbose_build: bool,
    /// `owner/name` for the release CLI; the CLI infers it when unset
    pub release_repo: Option<String>,
    /// Prefix of the timestamped release tag
    pub tag_prefix: String,
    pub publish: PublishMode,
}

impl BuildConfig {
    /// The line registered in the feed configuration file.
    pub fn feed_declaration(&self) -> String {
        match &self.feed_line {
            Some(line) => line.trim_end().to_string(),
            None => format!("src-git {} {}", self.feed_name, self.feed_url),
        }
    }

    /// Worker count for parallel download and build steps.
    pub fn job_count(&self) -> usize {
        self.jobs.unwrap_or_else(num_cpus::get).max(1)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            source_url: "https://github.com/openwrt/openwrt.git".to_string(),
            source_branch: "openwrt-24.10".to_string(),
            feed_name: "custom".to_string(),
            feed_url: "https://github.com/openwrt/packages.git".to_string(),
            feed_line: None,
            diffconfig: PathBuf::from("diffconfig"),
            source_dir: PathBuf::from("openwrt"),
            output_dir: PathBuf::from("output"),
            log_dir: PathBuf::from("logs"),
            artifact_subdir: PathBuf::from("bin/targets"),
            artifact_extensions: vec!["bin".to_string()],
            jobs: None,
            verbose_build: true,
            release_repo: None,
            tag_prefix: "build-".to_string(),
            publish: PublishMode::Ask,
        }
    }
}

/// Version-control metadata for one repository, as shown in the release notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub short_id: String,
    pub date: String,
    pub message: String,
}

impl CommitInfo {
    /// Placeholder used when a repository directory is absent.
    pub fn not_found() -> Self {
        CommitInfo {
            short_id: "N/A".to_string(),
            date: "N/A".to_string(),
            message: "Directory not found".to_string(),
        }
    }
}
