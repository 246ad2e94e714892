//! Release metadata record (`release-info.txt`).
//!
//! The rendered text doubles as the body of the published release notes, so
//! it is produced once and reused verbatim.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::error::{BuildError, Result};
use crate::models::{BuildConfig, CommitInfo};
use crate::release::artifacts::artifact_names;
use crate::source::git::{commit_info_or_placeholder, GitManager};
use crate::system::WorkspacePaths;

/// Origin and commit metadata of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSection {
    pub repository: String,
    pub branch: Option<String>,
    pub commit: CommitInfo,
}

/// Everything that goes into the release-info record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub build_time: DateTime<FixedOffset>,
    pub source: RepoSection,
    pub feed_name: String,
    pub feed: RepoSection,
    pub artifacts: Vec<String>,
}

impl ReleaseInfo {
    /// Query both repositories and assemble the record.
    ///
    /// The source tree must be a readable repository. The feed checkout may be
    /// missing, in which case placeholder values are used.
    pub fn gather(
        config: &BuildConfig,
        paths: &WorkspacePaths,
        artifacts: &[PathBuf],
        build_time: DateTime<FixedOffset>,
    ) -> Result<Self> {
        let source_commit = GitManager::open(&paths.source_dir)?.head_commit_info()?;
        let feed_commit = commit_info_or_placeholder(&paths.feed_repo_dir(&config.feed_name))?;

        Ok(ReleaseInfo {
            build_time,
            source: RepoSection {
                repository: config.source_url.clone(),
                branch: Some(config.source_branch.clone()),
                commit: source_commit,
            },
            feed_name: config.feed_name.clone(),
            feed: RepoSection {
                repository: config.feed_url.clone(),
                branch: None,
                commit: feed_commit,
            },
            artifacts: artifact_names(artifacts),
        })
    }

    /// Render the human-readable report.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Build Time: {}",
            self.build_time.to_rfc3339_opts(SecondsFormat::Secs, false)
        );
        out.push('\n');

        render_section(&mut out, "Source", &self.source);
        render_section(&mut out, &format!("Feed: {}", self.feed_name), &self.feed);

        out.push_str("[Artifacts]\n");
        if self.artifacts.is_empty() {
            out.push_str("(none)\n");
        } else {
            for name in &self.artifacts {
                let _ = writeln!(out, "- {}", name);
            }
        }
        out
    }

    /// Write the rendered report to `path` and return the text.
    pub fn write_to(&self, path: &Path) -> Result<String> {
        let text = self.render();
        fs::write(path, &text)
            .map_err(|e| BuildError::io(format!("writing {}", path.display()), e))?;
        log::info!("[Metadata] Release info written to {}", path.display());
        Ok(text)
    }
}

fn render_section(out: &mut String, heading: &str, section: &RepoSection) {
    let _ = writeln!(out, "[{}]", heading);
    let _ = writeln!(out, "Repository: {}", section.repository);
    if let Some(branch) = &section.branch {
        let _ = writeln!(out, "Branch: {}", branch);
    }
    let _ = writeln!(out, "Commit: {}", section.commit.short_id);
    let _ = writeln!(out, "Date: {}", section.commit.date);
    out.push_str("Message:\n");
    let _ = writeln!(out, "{}", section.commit.message);
    out.push('\n');
}
