//! Configuration module for the prototype forge
//!
//! Supports YAML configuration files, programmatic construction through the
//! `Default` impls, and `PROTOFORGE_*` environment overrides.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::ForgeError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<ForgeConfig, ForgeError> {
    ConfigLoader::from_file(path).await
}

/// Validate a configuration
pub fn validate_config(config: &ForgeConfig) -> Result<(), ForgeError> {
    config.validate()
}
