//! Shared fixtures: local upstream repositories and a simulated build system.

#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fwforge::{
    BuildConfig, BuildError, CommandRunner, CommandSpec, Pipeline, PublishMode, RunReport,
    WorkspacePaths,
};
use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Fixed commit time: 2023-11-14 22:13:20 UTC.
pub const COMMIT_EPOCH: i64 = 1_700_000_000;

pub const UPSTREAM_FEEDS: &str = "src-git packages https://git.openwrt.org/feed/packages.git\n";

pub fn signature() -> Signature<'static> {
    Signature::new(
        "Test User",
        "test@example.com",
        &git2::Time::new(COMMIT_EPOCH, 0),
    )
    .expect("Failed to create signature")
}

/// Create a non-bare repository whose HEAD is `refs/heads/main`.
pub fn init_repo(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(path, &opts).expect("Failed to init repo")
}

/// Write `name` and commit it on the current HEAD branch.
pub fn commit_file(repo: &Repository, name: &str, contents: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("bare repo").to_path_buf();
    let file = workdir.join(name);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent");
    }
    fs::write(&file, contents).expect("Failed to write file");

    let mut index = repo.index().expect("Failed to get index");
    index.add_path(Path::new(name)).expect("Failed to add file");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");

    let parents = match repo.head().ok().and_then(|h| h.peel_to_commit().ok()) {
        Some(parent) => vec![parent],
        None => vec![],
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    let sig = signature();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .expect("Failed to commit")
}

pub fn head_oid(path: &Path) -> Oid {
    Repository::open(path)
        .expect("Failed to open repo")
        .head()
        .expect("No HEAD")
        .peel_to_commit()
        .expect("HEAD is not a commit")
        .id()
}

/// Simulated build system.
///
/// Records every command. `make -j<n>` drops the configured images into
/// `bin/targets/`; `scripts/feeds update` optionally clones a feed fixture
/// into `feeds/<name>`. A command whose rendering contains `fail_on` fails.
pub struct SimulatedBuild {
    calls: Mutex<Vec<CommandSpec>>,
    pub images: Vec<String>,
    pub payload: String,
    pub feed_checkout: Option<(String, PathBuf)>,
    pub fail_on: Option<String>,
}

impl SimulatedBuild {
    pub fn new(images: &[&str], payload: &str) -> Self {
        SimulatedBuild {
            calls: Mutex::new(Vec::new()),
            images: images.iter().map(|s| s.to_string()).collect(),
            payload: payload.to_string(),
            feed_checkout: None,
            fail_on: None,
        }
    }

    pub fn with_feed_checkout(mut self, name: &str, upstream: &Path) -> Self {
        self.feed_checkout = Some((name.to_string(), upstream.to_path_buf()));
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose program file name is `program`.
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.program_name() == program)
            .collect()
    }
}

impl CommandRunner for SimulatedBuild {
    fn run(&self, spec: &CommandSpec) -> fwforge::Result<()> {
        self.calls.lock().unwrap().push(spec.clone());

        if let Some(needle) = &self.fail_on {
            if spec.to_string().contains(needle.as_str()) {
                return Err(BuildError::CommandFailed {
                    cmd: spec.to_string(),
                    status: "exit code 2".to_string(),
                });
            }
        }

        let cwd = spec.cwd.clone().unwrap_or_default();
        let first = spec.args.first().map(String::as_str).unwrap_or_default();

        match spec.program_name().as_str() {
            "make" if first.starts_with("-j") => {
                for image in &self.images {
                    let path = cwd.join("bin/targets").join(image);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(&path, &self.payload).unwrap();
                }
            }
            "feeds" if first == "update" => {
                if let Some((name, upstream)) = &self.feed_checkout {
                    let target = cwd.join("feeds").join(name);
                    if !target.exists() {
                        Repository::clone(upstream.to_str().unwrap(), &target)
                            .expect("Failed to clone feed fixture");
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Scratch workspace: an upstream source repository, a working root with a
/// diff-config, and a config pointing at both.
pub struct Workspace {
    pub temp: TempDir,
    pub upstream: PathBuf,
    pub root: PathBuf,
    pub config: BuildConfig,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let upstream = temp.path().join("upstream");
        let repo = init_repo(&upstream);
        commit_file(&repo, "feeds.conf.default", UPSTREAM_FEEDS, "Initial tree");

        let root = temp.path().join("work");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("diffconfig"), "CONFIG_TARGET_ath79=y\n").unwrap();

        let config = BuildConfig {
            source_url: upstream.to_string_lossy().to_string(),
            source_branch: "main".to_string(),
            jobs: Some(2),
            publish: PublishMode::Ask,
            ..BuildConfig::default()
        };

        Workspace {
            temp,
            upstream,
            root,
            config,
        }
    }

    pub fn paths(&self) -> WorkspacePaths {
        WorkspacePaths::resolve(&self.root, &self.config)
    }

    pub fn upstream_repo(&self) -> Repository {
        Repository::open(&self.upstream).expect("Failed to open upstream")
    }

    /// Run the pipeline with `answer` as the operator's input. Returns the
    /// result and everything written to the prompt stream.
    pub fn run(&self, runner: &SimulatedBuild, answer: &str) -> (fwforge::Result<RunReport>, String) {
        let mut pipeline = Pipeline::new(&self.config, self.paths(), runner);
        let mut input = Cursor::new(answer.to_string());
        let mut prompt = Vec::new();
        let result = pipeline.run(&mut input, &mut prompt);
        (result, String::from_utf8(prompt).unwrap())
    }
}

/// Sorted names of the entries in `dir`.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
