//! Native git management using the `git2` crate.
//!
//! Source synchronization (clone-once, update-thereafter) and the read-only
//! commit metadata queries used for release notes. No `git` binary is
//! invoked.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use git2::build::CheckoutBuilder;
use git2::{FetchOptions, ObjectType, Oid, RemoteCallbacks, Repository};
use thiserror::Error;

use crate::models::CommitInfo;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Clone error: {0}")]
    Clone(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Reference not found: {0}")]
    RefNotFound(String),

    #[error("Git2 error: {0}")]
    Git2(#[from] git2::Error),
}

/// Result type for git operations
pub type GitResult<T> = Result<T, GitError>;

/// Remote name used for every clone.
const ORIGIN: &str = "origin";

/// Refspecs fetched on update: all branches into remote-tracking refs, all tags.
const FETCH_REFSPECS: &[&str] = &[
    "+refs/heads/*:refs/remotes/origin/*",
    "+refs/tags/*:refs/tags/*",
];

/// Format a git timestamp like `git log --date=iso`: `2024-05-01 13:37:00 +0200`.
pub fn format_git_time(time: git2::Time) -> String {
    const ISO: &str = "%Y-%m-%d %H:%M:%S %z";
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60);
    match (DateTime::from_timestamp(time.seconds(), 0), offset) {
        (Some(utc), Some(offset)) => utc.with_timezone(&offset).format(ISO).to_string(),
        (Some(utc), None) => utc.format(ISO).to_string(),
        (None, _) => time.seconds().to_string(),
    }
}

/// Progress reporting shared by clone and fetch.
fn fetch_options<'a>(label: &'static str) -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut last_percent = u32::MAX;
    callbacks.transfer_progress(move |progress| {
        let total = progress.total_objects();
        if total > 0 {
            let percent = (progress.received_objects() as f32 / total as f32 * 100.0) as u32;
            if percent != last_percent && percent % 10 == 0 {
                log::debug!(
                    "[Git] [{}] [PROGRESS] {}/{} objects ({} indexed) - {}%",
                    label,
                    progress.received_objects(),
                    total,
                    progress.indexed_objects(),
                    percent
                );
                last_percent = percent;
            }
        }
        true
    });

    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// Manages a local checkout using native git bindings
pub struct GitManager {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitManager {
    /// Opens an existing repository
    pub fn open(repo_path: impl AsRef<Path>) -> GitResult<Self> {
        let repo_path = repo_path.as_ref().to_path_buf();
        let repo = Repository::open(&repo_path).map_err(|e| {
            GitError::Repository(format!(
                "Failed to open repository at {}: {}",
                repo_path.display(),
                e
            ))
        })?;
        Ok(GitManager { repo, repo_path })
    }

    /// Clones `url` into `target_path` and checks out `branch`.
    ///
    /// A full clone is used: the checkout must later be able to move to any
    /// branch or tag without re-cloning.
    pub fn clone_branch(url: &str, branch: &str, target_path: impl AsRef<Path>) -> GitResult<Self> {
        let target_path = target_path.as_ref();
        log::info!("[Git] [CLONE] Cloning {} into {}", url, target_path.display());

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_options("CLONE"));
        let repo = builder.clone(url, target_path).map_err(|e| {
            GitError::Clone(format!(
                "Failed to clone {} to {}: {}",
                url,
                target_path.display(),
                e
            ))
        })?;

        let manager = GitManager {
            repo,
            repo_path: target_path.to_path_buf(),
        };
        manager.checkout_branch(branch)?;
        log::info!("[Git] [CLONE] ✓ Clone completed at branch {}", branch);
        Ok(manager)
    }

    /// Fetches all branches and tags from `origin`
    pub fn fetch(&self) -> GitResult<()> {
        let mut remote = self.repo.find_remote(ORIGIN).map_err(|e| {
            GitError::Fetch(format!("Failed to find {} remote: {}", ORIGIN, e))
        })?;

        log::info!(
            "[Git] [FETCH] Fetching {} for {}",
            remote.url().unwrap_or("<non-utf8 url>"),
            self.repo_path.display()
        );
        remote
            .fetch(FETCH_REFSPECS, Some(&mut fetch_options("FETCH")), None)
            .map_err(|e| GitError::Fetch(format!("Fetch failed: {}", e)))?;
        Ok(())
    }

    /// Checks out `name` at the tip `origin` advertises.
    ///
    /// A remote branch moves (or creates) the local branch of the same name
    /// and attaches HEAD to it; a tag detaches HEAD at the tagged commit. The
    /// working tree is forced to match, so an updated checkout ends up where a
    /// fresh clone would.
    pub fn checkout_branch(&self, name: &str) -> GitResult<()> {
        let remote_ref = format!("refs/remotes/{}/{}", ORIGIN, name);
        if let Ok(reference) = self.repo.find_reference(&remote_ref) {
            let commit = reference.peel_to_commit()?;
            self.force_checkout(commit.id(), name)?;

            let local_ref = format!("refs/heads/{}", name);
            self.repo.reference(
                &local_ref,
                commit.id(),
                true,
                &format!("fwforge: sync {} to {}", name, remote_ref),
            )?;
            self.repo.set_head(&local_ref).map_err(|e| {
                GitError::Checkout(format!("Failed to set HEAD to {}: {}", local_ref, e))
            })?;
            log::info!("[Git] [CHECKOUT] ✓ {} at {}", name, short_oid(commit.id()));
            return Ok(());
        }

        let tag_ref = format!("refs/tags/{}", name);
        if let Ok(reference) = self.repo.find_reference(&tag_ref) {
            let commit = reference.peel_to_commit()?;
            self.force_checkout(commit.id(), name)?;
            self.repo.set_head_detached(commit.id()).map_err(|e| {
                GitError::Checkout(format!("Failed to detach HEAD at {}: {}", name, e))
            })?;
            log::info!("[Git] [CHECKOUT] ✓ tag {} at {}", name, short_oid(commit.id()));
            return Ok(());
        }

        Err(GitError::RefNotFound(format!(
            "'{}' is neither a branch nor a tag of {}",
            name, ORIGIN
        )))
    }

    fn force_checkout(&self, oid: Oid, name: &str) -> GitResult<()> {
        let object = self.repo.find_object(oid, Some(ObjectType::Commit))?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_tree(&object, Some(&mut checkout))
            .map_err(|e| GitError::Checkout(format!("Failed to check out {}: {}", name, e)))
    }

    /// Gets the current HEAD commit hash
    pub fn get_head_commit(&self) -> GitResult<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::Repository(format!("Failed to read HEAD: {}", e)))?;
        let commit = head.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Short id, author date and full message of HEAD.
    pub fn head_commit_info(&self) -> GitResult<CommitInfo> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::Repository(format!("Failed to read HEAD: {}", e)))?;
        let commit = head.peel_to_commit()?;

        let short_id = commit
            .as_object()
            .short_id()?
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| short_oid(commit.id()));
        let when = commit.author().when();

        Ok(CommitInfo {
            short_id,
            date: format_git_time(when),
            message: String::from_utf8_lossy(commit.message_bytes())
                .trim_end()
                .to_string(),
        })
    }

    /// Returns the path to the repository
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

fn short_oid(oid: Oid) -> String {
    oid.to_string().chars().take(7).collect()
}

/// Clone `url` at `branch` into `path` if absent, otherwise fetch and move
/// the existing checkout to the branch tip.
pub fn sync_repository(url: &str, branch: &str, path: &Path) -> GitResult<GitManager> {
    if path.exists() {
        log::info!(
            "[Git] [SYNC] Existing checkout at {}, updating in place",
            path.display()
        );
        let manager = GitManager::open(path)?;
        manager.fetch()?;
        manager.checkout_branch(branch)?;
        Ok(manager)
    } else {
        GitManager::clone_branch(url, branch, path)
    }
}

/// Commit metadata of the repository at `path`, or placeholders when the
/// directory does not exist.
pub fn commit_info_or_placeholder(path: &Path) -> GitResult<CommitInfo> {
    if !path.is_dir() {
        log::warn!(
            "[Git] {} not found, using placeholder metadata",
            path.display()
        );
        return Ok(CommitInfo::not_found());
    }
    GitManager::open(path)?.head_commit_info()
}
