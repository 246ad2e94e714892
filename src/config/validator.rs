//! Configuration validation.
//!
//! Catches values that would only surface as a confusing failure deep inside
//! the pipeline (an empty URL handed to git, a zero worker count handed to
//! make, a tag the release CLI refuses).

use crate::error::ConfigError;
use crate::models::BuildConfig;

/// Validate a build configuration before the run starts.
pub fn validate_config(config: &BuildConfig) -> Result<(), ConfigError> {
    require_non_empty("source_url", &config.source_url)?;
    require_non_empty("source_branch", &config.source_branch)?;
    require_non_empty("feed_name", &config.feed_name)?;
    require_non_empty("feed_url", &config.feed_url)?;

    let feed_line = config.feed_declaration();
    if feed_line.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "feed_line cannot be empty".to_string(),
        ));
    }
    if feed_line.contains('\n') || feed_line.contains('\r') {
        return Err(ConfigError::ValidationFailed(
            "feed_line must be a single line".to_string(),
        ));
    }

    if config.artifact_extensions.is_empty()
        || config.artifact_extensions.iter().any(|ext| ext.trim().is_empty())
    {
        return Err(ConfigError::ValidationFailed(
            "artifact_extensions must list at least one non-empty extension".to_string(),
        ));
    }

    if config.jobs == Some(0) {
        return Err(ConfigError::ValidationFailed(
            "jobs must be at least 1".to_string(),
        ));
    }

    if config.tag_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::ValidationFailed(format!(
            "tag_prefix '{}' must not contain whitespace",
            config.tag_prefix
        )));
    }

    if config.output_dir.as_os_str().is_empty() || config.source_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "source_dir and output_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationFailed(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}
