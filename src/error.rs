//! Unified error type hierarchy for fwforge
//!
//! Provides structured error handling with ConfigError and BuildError. Git
//! failures live next to the git wrapper (`source::git::GitError`) and are
//! folded into BuildError at the pipeline boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::source::git::GitError;

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Pipeline execution errors.
///
/// Every variant is fatal: the pipeline stops at the first one and the
/// binary exits non-zero.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The diff-config overlay is missing; checked before anything is written
    /// into the source tree.
    #[error("Diff-config file not found: {}", .0.display())]
    MissingDiffConfig(PathBuf),

    #[error("Command '{cmd}' failed: {status}")]
    CommandFailed { cmd: String, status: String },

    #[error("Command '{cmd}' could not be started: {reason}")]
    CommandSpawn { cmd: String, reason: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] GitError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No build artifacts found under {}", .0.display())]
    NoArtifacts(PathBuf),

    #[error("Failed to read operator response: {0}")]
    Prompt(String),

    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Preflight check failed:\n{0}")]
    Preflight(String),
}

impl BuildError {
    /// Wrap an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for the explicit precondition failure, as opposed to failures
    /// inferred from an external command's exit status.
    pub fn is_precondition(&self) -> bool {
        matches!(self, BuildError::MissingDiffConfig(_))
    }
}

/// Result type used across the pipeline.
pub type Result<T> = std::result::Result<T, BuildError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::FileNotFound("/etc/fwforge.toml".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /etc/fwforge.toml"
        );
    }

    #[test]
    fn test_missing_diffconfig_is_precondition() {
        let err = BuildError::MissingDiffConfig(PathBuf::from("diffconfig"));
        assert!(err.is_precondition());
        assert_eq!(err.to_string(), "Diff-config file not found: diffconfig");
    }

    #[test]
    fn test_command_failed_display() {
        let err = BuildError::CommandFailed {
            cmd: "make defconfig".to_string(),
            status: "exit status: 2".to_string(),
        };
        assert!(!err.is_precondition());
        assert_eq!(err.to_string(), "Command 'make defconfig' failed: exit status: 2");
    }

    #[test]
    fn test_io_error_keeps_context() {
        let err = BuildError::io(
            "creating output directory",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "creating output directory: denied");
    }
}
