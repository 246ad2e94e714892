//! Run state management and stage tracking.
//!
//! **Architecture**:
//! - `PipelineStage`: Enum representing the discrete stages of one run
//! - `RunState`: Struct tracking the current stage, timings and failure reason
//! - Transitions are driven by `Pipeline`; anything outside the allowed graph
//!   is rejected with `BuildError::InvalidTransition`

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime};

use crate::error::BuildError;

/// Number of numbered stages shown in banners (`[n/9]`).
pub const NUMBERED_STAGES: u8 = 9;

/// Run stage enumeration - discrete states in the run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Nothing has happened yet
    Start,

    /// Stage 1: Wipe or create the output directory
    Prepare,

    /// Stage 2: Clone or update the source tree
    Sync,

    /// Stage 3: Register the custom feed, update and install feeds
    Feeds,

    /// Stage 4: Apply the diff-config and expand it
    Configure,

    /// Stage 5: Fetch upstream sources
    Download,

    /// Stage 6: Compile firmware images
    Build,

    /// Stage 7: Copy images into the output directory
    Collect,

    /// Stage 8: Write the release-info record
    Metadata,

    /// Stage 9 (confirmed): Create the hosted release
    Publish,

    /// Stage 9 (declined): No release created
    Skip,

    /// Run completed successfully
    Done,

    /// Run stopped at the first failure; no rollback
    Aborted,
}

impl PipelineStage {
    /// Short machine-friendly name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Start => "start",
            PipelineStage::Prepare => "prepare",
            PipelineStage::Sync => "sync",
            PipelineStage::Feeds => "feeds",
            PipelineStage::Configure => "configure",
            PipelineStage::Download => "download",
            PipelineStage::Build => "build",
            PipelineStage::Collect => "collect",
            PipelineStage::Metadata => "metadata",
            PipelineStage::Publish => "publish",
            PipelineStage::Skip => "skip",
            PipelineStage::Done => "done",
            PipelineStage::Aborted => "aborted",
        }
    }

    /// Human-readable banner text.
    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::Start => "Starting",
            PipelineStage::Prepare => "Preparing output directory",
            PipelineStage::Sync => "Synchronizing source tree",
            PipelineStage::Feeds => "Registering and installing feeds",
            PipelineStage::Configure => "Applying diff-config",
            PipelineStage::Download => "Downloading sources",
            PipelineStage::Build => "Building firmware",
            PipelineStage::Collect => "Collecting artifacts",
            PipelineStage::Metadata => "Writing release info",
            PipelineStage::Publish => "Publishing release",
            PipelineStage::Skip => "Skipping release",
            PipelineStage::Done => "Done",
            PipelineStage::Aborted => "Aborted",
        }
    }

    /// Position in the `[n/9]` numbering. Publish and Skip share the last
    /// slot since exactly one of them runs.
    pub fn step_number(&self) -> Option<u8> {
        match self {
            PipelineStage::Prepare => Some(1),
            PipelineStage::Sync => Some(2),
            PipelineStage::Feeds => Some(3),
            PipelineStage::Configure => Some(4),
            PipelineStage::Download => Some(5),
            PipelineStage::Build => Some(6),
            PipelineStage::Collect => Some(7),
            PipelineStage::Metadata => Some(8),
            PipelineStage::Publish | PipelineStage::Skip => Some(NUMBERED_STAGES),
            PipelineStage::Start | PipelineStage::Done | PipelineStage::Aborted => None,
        }
    }

    /// Banner line, e.g. `[6/9] Building firmware`.
    pub fn banner(&self) -> String {
        match self.step_number() {
            Some(n) => format!("[{}/{}] {}", n, NUMBERED_STAGES, self.description()),
            None => self.description().to_string(),
        }
    }

    /// Get all valid transitions FROM this stage.
    pub fn valid_next_stages(&self) -> Vec<PipelineStage> {
        use PipelineStage::*;
        match self {
            Start => vec![Prepare, Aborted],
            Prepare => vec![Sync, Aborted],
            Sync => vec![Feeds, Aborted],
            Feeds => vec![Configure, Aborted],
            Configure => vec![Download, Aborted],
            Download => vec![Build, Aborted],
            Build => vec![Collect, Aborted],
            Collect => vec![Metadata, Aborted],
            Metadata => vec![Publish, Skip, Aborted],
            Publish => vec![Done, Aborted],
            Skip => vec![Done, Aborted],
            Done => vec![],
            Aborted => vec![],
        }
    }

    /// Check if a transition to the given stage is valid.
    pub fn can_transition_to(&self, next: PipelineStage) -> bool {
        self.valid_next_stages().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Aborted)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time spent in one completed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed: Duration,
}

/// Execution state of a single run.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Current stage
    pub stage: PipelineStage,

    /// Run start timestamp
    pub start_time: SystemTime,

    /// When the current stage was entered
    stage_entered: Instant,

    /// Completed stages in order
    pub history: Vec<StageTiming>,

    /// Error message if the run aborted
    pub error: Option<String>,

    /// Stage that was running when the run aborted
    pub failed_stage: Option<PipelineStage>,
}

impl RunState {
    pub fn new() -> Self {
        RunState {
            stage: PipelineStage::Start,
            start_time: SystemTime::now(),
            stage_entered: Instant::now(),
            history: Vec::new(),
            error: None,
            failed_stage: None,
        }
    }

    /// Attempt to transition to the next stage.
    pub fn transition_to(&mut self, next: PipelineStage) -> Result<(), BuildError> {
        if !self.stage.can_transition_to(next) {
            return Err(BuildError::InvalidTransition {
                from: self.stage.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.close_stage();
        self.stage = next;
        Ok(())
    }

    /// Record an error and mark the run as aborted.
    ///
    /// A run that has already reached a terminal stage is left untouched.
    pub fn record_error(&mut self, error: String) {
        if self.stage.is_terminal() {
            return;
        }
        self.failed_stage = Some(self.stage);
        self.error = Some(error);
        self.stage = PipelineStage::Aborted;
    }

    /// Total wall time since the run started.
    pub fn elapsed_since_start(&self) -> Result<Duration, std::time::SystemTimeError> {
        self.start_time.elapsed()
    }

    fn close_stage(&mut self) {
        let now = Instant::now();
        if self.stage != PipelineStage::Start {
            self.history.push(StageTiming {
                stage: self.stage,
                elapsed: now.duration_since(self.stage_entered),
            });
        }
        self.stage_entered = now;
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
