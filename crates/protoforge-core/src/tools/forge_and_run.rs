//! The `forge_and_run` tool
//!
//! Lets an agent run a generate-execute-analyze loop: it hands over a
//! self-contained script plus a short purpose, and gets back what the script
//! printed, how it exited, and which files it left in its output directory.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::errors::ForgeError;
use crate::forge::PrototypeForge;
use crate::tools::{Tool, ToolMetadata};

const TOOL_NAME: &str = "forge_and_run";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
}

pub struct ForgeAndRunTool {
    forge: Arc<PrototypeForge>,
    format: ReportFormat,
}

impl ForgeAndRunTool {
    pub fn new(forge: Arc<PrototypeForge>) -> Self {
        Self {
            forge,
            format: ReportFormat::Json,
        }
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    fn string_arg<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ForgeError> {
        arguments
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ForgeError::tool(TOOL_NAME, format!("Missing or invalid '{}' parameter", key)))
    }
}

#[async_trait]
impl Tool for ForgeAndRunTool {
    fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: TOOL_NAME.to_string(),
            description: "Write a standalone Python prototype into a fresh, timestamped workspace and run it \
                immediately with `uv run`. Declare third-party dependencies inline with PEP 723 script \
                metadata. Save generated files (CSV, plots, logs) to the directory named by the \
                PROTOTYPE_OUTPUT_DIR environment variable. The working directory is the workspace and \
                execution is killed after the configured timeout (180 seconds by default). Returns the \
                exit status, stdout, stderr and the list of generated artifacts."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": "Complete, self-contained script source"
                    },
                    "purpose": {
                        "type": "string",
                        "description": "Short description of the prototype's objective, used in the workspace name"
                    }
                },
                "required": ["code", "purpose"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> Result<String, ForgeError> {
        let code = Self::string_arg(&arguments, "code")?;
        let purpose = Self::string_arg(&arguments, "purpose")?;

        log::info!("forge_and_run: {}", purpose);
        let report = self.forge.forge_and_run(code, purpose).await?;

        match self.format {
            ReportFormat::Json => Ok(report.to_json()?),
            ReportFormat::Text => Ok(report.render_text()),
        }
    }
}
