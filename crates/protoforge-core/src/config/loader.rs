//! Configuration loader for YAML files and environment overrides
//!
//! Resolution order: built-in defaults, then the YAML file (if any), then
//! `PROTOFORGE_*` environment variables. A leading `~/` in the workspace root
//! is expanded against the user's home directory before validation.

use crate::config::types::ForgeConfig;
use crate::errors::ForgeError;
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const ROOT_ENV: &str = "PROTOFORGE_ROOT";
pub const TIMEOUT_ENV: &str = "PROTOFORGE_TIMEOUT";
pub const PROGRAM_ENV: &str = "PROTOFORGE_PROGRAM";

/// Configuration loader with environment resolution
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path` when given, otherwise start from defaults
    pub async fn load(path: Option<&Path>) -> Result<ForgeConfig, ForgeError> {
        match path {
            Some(path) => Self::from_file(path).await,
            None => Self::finish(ForgeConfig::default()),
        }
    }

    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<ForgeConfig, ForgeError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            ForgeError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        log::debug!("Loaded configuration file {}", path.display());
        Self::from_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<ForgeConfig, ForgeError> {
        let config: ForgeConfig = if content.trim().is_empty() {
            ForgeConfig::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| ForgeError::Config(format!("Failed to parse YAML config: {}", e)))?
        };
        Self::finish(config)
    }

    fn finish(mut config: ForgeConfig) -> Result<ForgeConfig, ForgeError> {
        Self::apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.workspace.root = expand_home(&config.workspace.root);
        config.validate()?;
        Ok(config)
    }

    /// Apply `PROTOFORGE_*` overrides using the given variable lookup
    pub fn apply_overrides<F>(config: &mut ForgeConfig, lookup: F) -> Result<(), ForgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ROOT_ENV).filter(|v| !v.is_empty()) {
            log::debug!("Workspace root overridden by {}: {}", ROOT_ENV, root);
            config.workspace.root = PathBuf::from(root);
        }

        if let Some(timeout) = lookup(TIMEOUT_ENV).filter(|v| !v.is_empty()) {
            config.execution.timeout_seconds = timeout.trim().parse().map_err(|_| {
                ForgeError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    TIMEOUT_ENV, timeout
                ))
            })?;
        }

        if let Some(program) = lookup(PROGRAM_ENV).filter(|v| !v.is_empty()) {
            config.execution.program = program;
        }

        Ok(())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
