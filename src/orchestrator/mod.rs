//! Build Orchestration: the linear firmware release pipeline.
//!
//! Prepare -> Sync -> Feeds -> Configure -> Download -> Build -> Collect ->
//! Metadata -> (Publish | Skip) -> Done. The first failing stage aborts the
//! run; nothing already written is rolled back.

pub mod executor;
pub mod phases;
pub mod state;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Local};

pub use executor::{build_firmware, download_sources};
pub use phases::prepare_output_dir;
pub use state::{PipelineStage, RunState};

use crate::config::apply_diffconfig;
use crate::error::Result;
use crate::models::BuildConfig;
use crate::release::{
    clear_stale_artifacts, collect_artifacts, list_output_dir, publish_release, release_tag,
    should_publish, ReleaseInfo,
};
use crate::source::{register_feeds, sync_repository};
use crate::system::{CommandRunner, WorkspacePaths};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Terminal stage (`Done`)
    pub stage: PipelineStage,
    /// Artifact copies inside the output directory
    pub artifacts: Vec<PathBuf>,
    pub release_info_path: PathBuf,
    /// Tag of the created release, if the run published one
    pub published_tag: Option<String>,
}

/// Drives one run over a frozen configuration.
pub struct Pipeline<'a> {
    config: &'a BuildConfig,
    paths: WorkspacePaths,
    runner: &'a dyn CommandRunner,
    state: RunState,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a BuildConfig, paths: WorkspacePaths, runner: &'a dyn CommandRunner) -> Self {
        Pipeline {
            config,
            paths,
            runner,
            state: RunState::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    /// Execute every stage in order.
    ///
    /// `input` and `output` carry the publish prompt; they are only touched
    /// in `ask` mode. On failure the state is left in `Aborted` with the
    /// failing stage recorded.
    pub fn run(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<RunReport> {
        log::info!(
            "[Pipeline] Building {} ({}) in {}",
            self.config.source_url,
            self.config.source_branch,
            self.paths.root.display()
        );

        let result = self.run_stages(input, output);

        match &result {
            Ok(report) => {
                let elapsed = self
                    .state
                    .elapsed_since_start()
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                log::info!(
                    "[Pipeline] Finished in {}s: {} artifact(s){}",
                    elapsed,
                    report.artifacts.len(),
                    report
                        .published_tag
                        .as_ref()
                        .map(|tag| format!(", released as {}", tag))
                        .unwrap_or_default()
                );
            }
            Err(e) => {
                let stage = self.state.stage;
                self.state.record_error(e.to_string());
                log::error!("[Pipeline] Aborted during {}: {}", stage, e);
            }
        }

        result
    }

    fn run_stages(&mut self, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<RunReport> {
        self.enter(PipelineStage::Prepare)?;
        prepare_output_dir(&self.paths.output_dir)?;

        self.enter(PipelineStage::Sync)?;
        let source = sync_repository(
            &self.config.source_url,
            &self.config.source_branch,
            &self.paths.source_dir,
        )?;
        log::info!(
            "[Sync] {} at {}",
            self.config.source_branch,
            source.get_head_commit()?
        );

        self.enter(PipelineStage::Feeds)?;
        register_feeds(self.runner, &self.paths, &self.config.feed_declaration())?;

        self.enter(PipelineStage::Configure)?;
        apply_diffconfig(self.runner, &self.paths)?;

        self.enter(PipelineStage::Download)?;
        download_sources(self.runner, self.config, &self.paths)?;

        self.enter(PipelineStage::Build)?;
        clear_stale_artifacts(&self.paths.artifact_root, &self.config.artifact_extensions)?;
        build_firmware(self.runner, self.config, &self.paths)?;

        self.enter(PipelineStage::Collect)?;
        let artifacts = collect_artifacts(
            &self.paths.artifact_root,
            &self.paths.output_dir,
            &self.config.artifact_extensions,
        )?;

        self.enter(PipelineStage::Metadata)?;
        let build_time = DateTime::<FixedOffset>::from(Local::now());
        let release_info_path = self.paths.release_info();
        ReleaseInfo::gather(self.config, &self.paths, &artifacts, build_time)?
            .write_to(&release_info_path)?;
        list_output_dir(&self.paths.output_dir)?;

        let published_tag = if should_publish(self.config.publish, input, output)? {
            self.enter(PipelineStage::Publish)?;
            let tag = release_tag(&self.config.tag_prefix, &Local::now());
            publish_release(self.runner, self.config, &tag, &artifacts, &release_info_path)?;
            Some(tag)
        } else {
            self.enter(PipelineStage::Skip)?;
            log::info!("[Publish] Release not published");
            None
        };

        self.enter(PipelineStage::Done)?;
        Ok(RunReport {
            stage: self.state.stage,
            artifacts,
            release_info_path,
            published_tag,
        })
    }

    fn enter(&mut self, stage: PipelineStage) -> Result<()> {
        self.state.transition_to(stage)?;
        log::info!("{}", stage.banner());
        Ok(())
    }
}
