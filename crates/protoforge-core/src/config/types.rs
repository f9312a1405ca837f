//! Configuration type definitions for the prototype forge
//!
//! Every field has a default so an empty YAML document (or no file at all)
//! yields a working setup: runs land under `~/.hidden_prototype`, scripts are
//! executed with `uv run`, and the child is killed after 180 seconds.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::errors::ForgeError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForgeConfig {
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where run directories are created and how they are laid out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_script_name")]
    pub script_name: String,
    #[serde(default = "default_output_dir_name")]
    pub output_dir_name: String,
    #[serde(default = "default_max_purpose_len")]
    pub max_purpose_len: usize,
}

/// How the external execution tool is found and launched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_output_env_var")]
    pub output_env_var: String,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".hidden_prototype"))
        .unwrap_or_else(|| PathBuf::from(".hidden_prototype"))
}

fn default_script_name() -> String {
    "script.py".to_string()
}

fn default_output_dir_name() -> String {
    "outputs".to_string()
}

fn default_max_purpose_len() -> usize {
    30
}

fn default_program() -> String {
    "uv".to_string()
}

fn default_args() -> Vec<String> {
    vec!["run".to_string()]
}

fn default_timeout_seconds() -> u64 {
    180
}

fn default_output_env_var() -> String {
    "PROTOTYPE_OUTPUT_DIR".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            script_name: default_script_name(),
            output_dir_name: default_output_dir_name(),
            max_purpose_len: default_max_purpose_len(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            search_dirs: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
            output_env_var: default_output_env_var(),
            env: HashMap::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ForgeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ForgeError> {
        self.workspace.validate()?;
        self.execution.validate()?;
        Ok(())
    }
}

impl WorkspaceConfig {
    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.root.as_os_str().is_empty() {
            return Err(ForgeError::Config("workspace root cannot be empty".to_string()));
        }
        validate_file_name("script_name", &self.script_name)?;
        validate_file_name("output_dir_name", &self.output_dir_name)?;
        if self.script_name == self.output_dir_name {
            return Err(ForgeError::Config(
                "script_name and output_dir_name must differ".to_string(),
            ));
        }
        if self.max_purpose_len == 0 {
            return Err(ForgeError::Config(
                "max_purpose_len must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.program.trim().is_empty() {
            return Err(ForgeError::Config("execution program cannot be empty".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(ForgeError::Config(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.output_env_var.is_empty() || self.output_env_var.contains('=') {
            return Err(ForgeError::Config(format!(
                "Invalid output_env_var '{}'",
                self.output_env_var
            )));
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(ForgeError::Config(format!(
                    "Invalid environment variable name '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}

// Names placed inside a run directory must stay inside it.
fn validate_file_name(field: &str, value: &str) -> Result<(), ForgeError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ForgeError::Config(format!(
            "{} must be a plain file name, got '{}'",
            field, value
        ))),
    }
}
