mod common;

use std::fs;

use common::*;
use fwforge::source::git::{commit_info_or_placeholder, sync_repository, GitError, GitManager};
use tempfile::tempdir;

#[test]
fn test_git_manager_clone_and_operations() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let clone_path = temp_dir.path().join("clone");

    // 1. Create a local source repository
    let repo = init_repo(&source_path);
    let oid = commit_file(&repo, "README.md", "# Test Repo", "Initial commit\n\nWith a body.\n");

    // 2. Clone at the branch
    let url = source_path.to_str().unwrap();
    let manager = GitManager::clone_branch(url, "main", &clone_path).expect("Failed to clone repository");

    assert!(clone_path.join(".git").exists());
    assert!(clone_path.join("README.md").exists());

    // 3. HEAD and metadata
    let head = manager.get_head_commit().expect("Failed to get HEAD commit");
    assert_eq!(head, oid.to_string());

    let info = manager.head_commit_info().unwrap();
    assert!(info.short_id.len() >= 7);
    assert!(head.starts_with(&info.short_id));
    assert_eq!(info.date, "2023-11-14 22:13:20 +0000");
    assert_eq!(info.message, "Initial commit\n\nWith a body.");

    // 4. repo_path
    assert_eq!(manager.repo_path(), clone_path);
}

#[test]
fn test_clone_checks_out_requested_branch() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let repo = init_repo(&source_path);
    commit_file(&repo, "VERSION", "main\n", "main tip");

    // Second branch with different content
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch("openwrt-24.10", &head, false).unwrap();
    repo.set_head("refs/heads/openwrt-24.10").unwrap();
    let release_tip = commit_file(&repo, "VERSION", "24.10\n", "release tip");
    repo.set_head("refs/heads/main").unwrap();

    let clone_path = temp_dir.path().join("clone");
    sync_repository(source_path.to_str().unwrap(), "openwrt-24.10", &clone_path).unwrap();

    assert_eq!(head_oid(&clone_path), release_tip);
    assert_eq!(fs::read_to_string(clone_path.join("VERSION")).unwrap(), "24.10\n");

    let clone = git2::Repository::open(&clone_path).unwrap();
    assert_eq!(clone.head().unwrap().shorthand(), Some("openwrt-24.10"));
}

#[test]
fn test_sync_updates_existing_checkout() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let repo = init_repo(&source_path);
    commit_file(&repo, "a.txt", "1", "first");

    let url = source_path.to_str().unwrap();
    let clone_path = temp_dir.path().join("clone");
    sync_repository(url, "main", &clone_path).unwrap();

    // Local edits to tracked files are discarded by the update
    fs::write(clone_path.join("a.txt"), "local edit").unwrap();
    let tip = commit_file(&repo, "b.txt", "2", "second");

    sync_repository(url, "main", &clone_path).unwrap();

    assert_eq!(head_oid(&clone_path), tip);
    assert_eq!(fs::read_to_string(clone_path.join("a.txt")).unwrap(), "1");
    assert!(clone_path.join("b.txt").is_file());
}

#[test]
fn test_sync_to_tag_detaches_head() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let repo = init_repo(&source_path);
    let tagged = commit_file(&repo, "a.txt", "1", "release v24.10.0");
    let object = repo.find_object(tagged, None).unwrap();
    repo.tag_lightweight("v24.10.0", &object, false).unwrap();
    commit_file(&repo, "a.txt", "2", "after release");

    let clone_path = temp_dir.path().join("clone");
    sync_repository(source_path.to_str().unwrap(), "v24.10.0", &clone_path).unwrap();

    let clone = git2::Repository::open(&clone_path).unwrap();
    assert!(clone.head_detached().unwrap());
    assert_eq!(head_oid(&clone_path), tagged);
}

#[test]
fn test_missing_branch_is_reported() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let source_path = temp_dir.path().join("source");
    let repo = init_repo(&source_path);
    commit_file(&repo, "a.txt", "1", "first");

    let clone_path = temp_dir.path().join("clone");
    let result = sync_repository(source_path.to_str().unwrap(), "no-such-branch", &clone_path);
    assert!(matches!(result, Err(GitError::RefNotFound(_))));
}

#[test]
fn test_git_manager_invalid_url() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let url = temp_dir.path().join("nonexistent_repo_12345");
    let clone_path = temp_dir.path().join("invalid_repo");

    let result = GitManager::clone_branch(url.to_str().unwrap(), "main", &clone_path);
    assert!(matches!(result, Err(GitError::Clone(_))));
}

#[test]
fn test_placeholder_for_missing_directory() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let info = commit_info_or_placeholder(&temp_dir.path().join("feeds/custom")).unwrap();
    assert_eq!(info.short_id, "N/A");
    assert_eq!(info.date, "N/A");
    assert_eq!(info.message, "Directory not found");
}

#[test]
fn test_existing_non_repository_directory_is_an_error() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    assert!(commit_info_or_placeholder(temp_dir.path()).is_err());
}
