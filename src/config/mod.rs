//! Configuration module for firmware builds.
//!
//! # Module Structure
//!
//! - `loader`: Loads the run's `BuildConfig` from TOML/JSON files or defaults
//! - `validator`: Rejects unusable configurations before the run starts
//! - `diffconfig`: Applies the diff-config overlay to the source tree
//!
//! # Configuration Flow
//!
//! 1. `loader` resolves a file (explicit, global, or none)
//! 2. CLI overrides are applied by the binary
//! 3. `validator` checks the final value
//! 4. The value is frozen and handed to the pipeline

pub mod diffconfig;
pub mod loader;
pub mod validator;

pub use diffconfig::{apply_diffconfig, require_diffconfig};
pub use loader::{load_config_from_file, resolve_config, ConfigOrigin};
pub use validator::validate_config;
