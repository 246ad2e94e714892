//! fwforge: firmware release builder
//!
//! Syncs an OpenWrt-style source tree, registers a custom package feed,
//! applies a diff-config, drives the external build, collects the images,
//! writes a release-info record and optionally publishes a tagged release.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Build configuration and commit metadata
//! - **config**: Configuration loading, validation and diff-config application
//! - **system**: External command seam, operator prompt, paths, preflight
//! - **log_collector**: Console + per-run log file backend for the `log` facade
//! - **source**: Source tree sync and feed registration
//! - **orchestrator**: Run state machine and the top-level `Pipeline`
//! - **release**: Artifact collection, release metadata and publishing

// Core foundational modules
pub mod error;
pub mod models;

pub mod config;
pub mod system;

// Robust, decoupled logging system
pub mod log_collector;

pub mod source;

pub mod orchestrator;

pub mod release;

// Re-export the log crate for macro usage
pub use log;

// ============================================================================
// PUBLIC RE-EXPORTS FOR CONVENIENCE
// ============================================================================

pub use error::{BuildError, ConfigError, Result};
pub use log_collector::{LogCollector, LogLine};
pub use models::{BuildConfig, CommitInfo, PublishMode};
pub use orchestrator::{Pipeline, PipelineStage, RunReport, RunState};
pub use release::{ReleaseInfo, RepoSection};
pub use source::GitError;
pub use system::{CommandRunner, CommandSpec, SystemRunner, WorkspacePaths};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
