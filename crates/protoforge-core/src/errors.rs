//! Error types for prototype provisioning and execution
//!
//! Only failures that happen before a run exists are surfaced as errors from
//! the forge itself. Everything downstream of workspace creation (launch
//! failures, script failures, timeouts) is folded into the run report, so the
//! variants here mostly describe configuration, provisioning and tool-binding
//! problems.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ForgeError {
    #[error("Failed to provision workspace at {path}: {message}")]
    Provisioning { path: String, message: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to launch execution tool: {0}")]
    Launch(String),
    #[error("Tool execution failed for '{tool_name}': {message}")]
    Tool { tool_name: String, message: String },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl ForgeError {
    pub fn provisioning(path: &Path, err: impl std::fmt::Display) -> Self {
        ForgeError::Provisioning {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }

    pub fn tool(tool_name: &str, message: impl Into<String>) -> Self {
        ForgeError::Tool {
            tool_name: tool_name.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ForgeError {
    fn from(err: std::io::Error) -> Self {
        ForgeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ForgeError {
    fn from(err: serde_json::Error) -> Self {
        ForgeError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ForgeError {
    fn from(err: serde_yaml::Error) -> Self {
        ForgeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioning_message_names_path() {
        let err = ForgeError::provisioning(Path::new("/nope/root"), "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("/nope/root"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ForgeError = io.into();
        assert!(matches!(err, ForgeError::Io(ref m) if m.contains("gone")));
    }
}
