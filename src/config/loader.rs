//! Config file loader and serialization.

use crate::error::ConfigError;
use crate::models::BuildConfig;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the global config path: ~/.config/fwforge/config.toml
pub fn get_global_config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine home directory".to_string())
    })?;

    Ok(home.join(".config/fwforge").join("config.toml"))
}

/// Supported on-disk formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

/// Load config from a TOML or JSON file.
pub fn load_config_from_file(path: &Path) -> Result<BuildConfig, ConfigError> {
    let format = validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    parse_config(&content, format)
}

/// Parse config text in the given format.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<BuildConfig, ConfigError> {
    let config = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

/// Where a resolved configuration came from.
///
/// Resolution runs before the logger exists (the log directory is itself a
/// config value), so the caller reports the origin once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Path given on the command line
    Explicit(PathBuf),
    /// `~/.config/fwforge/config.toml`
    Global(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigOrigin::Explicit(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Global(path) => write!(f, "{} (global)", path.display()),
            ConfigOrigin::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolve the config for a run.
///
/// An explicit path must exist. Without one, the global config is used when
/// present and built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(BuildConfig, ConfigOrigin), ConfigError> {
    if let Some(path) = explicit {
        let config = load_config_from_file(path)?;
        return Ok((config, ConfigOrigin::Explicit(path.to_path_buf())));
    }

    match get_global_config_path() {
        Ok(path) if path.exists() => {
            let config = load_config_from_file(&path)?;
            Ok((config, ConfigOrigin::Global(path)))
        }
        _ => Ok((BuildConfig::default(), ConfigOrigin::Defaults)),
    }
}

/// Validate config path (.toml or .json extension required).
pub fn validate_config_path(path: &Path) -> Result<ConfigFormat, ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(ConfigFormat::Toml),
        Some(ext) if ext == "json" => Ok(ConfigFormat::Json),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml or .json extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml or .json extension".to_string(),
        )),
    }
}
