//! Tool binding for calling agents
//!
//! A calling agent sees the forge as a named tool with a JSON input schema.
//! Tools are registered in a [`ToolRegistry`] and invoked with their JSON
//! arguments, which are checked against the advertised schema first.

use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ForgeError;
use crate::forge::PrototypeForge;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

// Core Tool trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    fn metadata(&self) -> ToolMetadata;
    async fn execute(&self, arguments: Value) -> Result<String, ForgeError>;
}

/// Check `arguments` against the tool's advertised input schema.
pub fn validate_arguments(metadata: &ToolMetadata, arguments: &Value) -> Result<(), ForgeError> {
    let schema = JSONSchema::compile(&metadata.input_schema).map_err(|e| {
        ForgeError::Validation(format!("Invalid input schema for '{}': {}", metadata.name, e))
    })?;

    let messages: Vec<String> = match schema.validate(arguments) {
        Ok(()) => return Ok(()),
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };

    Err(ForgeError::tool(
        &metadata.name,
        format!("Invalid arguments: {}", messages.join("; ")),
    ))
}

// Tool registry for managing multiple tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.metadata().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Metadata of every registered tool, sorted by name
    pub fn list_tools(&self) -> Vec<ToolMetadata> {
        let mut tools: Vec<ToolMetadata> = self.tools.values().map(|tool| tool.metadata()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn remove_tool(&mut self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.remove(name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Validate `arguments` and dispatch to the named tool
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String, ForgeError> {
        let tool = self
            .get_tool(name)
            .ok_or_else(|| ForgeError::tool(name, format!("Tool '{}' not found", name)))?;
        validate_arguments(&tool.metadata(), &arguments)?;
        tool.execute(arguments).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ToolFactory;

impl ToolFactory {
    pub fn create_forge_and_run(forge: Arc<PrototypeForge>, format: ReportFormat) -> Arc<dyn Tool> {
        Arc::new(ForgeAndRunTool::new(forge).with_format(format))
    }

    pub fn create_default_registry(forge: Arc<PrototypeForge>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Self::create_forge_and_run(forge, ReportFormat::Json));
        registry
    }
}

pub mod forge_and_run;

pub use forge_and_run::{ForgeAndRunTool, ReportFormat};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn metadata(&self) -> ToolMetadata {
            ToolMetadata {
                name: "echo".to_string(),
                description: "Echoes its text argument".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"text": {"type": "string"}},
                    "required": ["text"]
                }),
            }
        }

        async fn execute(&self, arguments: Value) -> Result<String, ForgeError> {
            Ok(arguments["text"].as_str().unwrap_or_default().to_string())
        }
    }

    #[test]
    fn test_tool_registry_register_and_get() {
        let mut registry = ToolRegistry::new();
        assert_eq!(registry.tool_count(), 0);

        registry.register_tool(Arc::new(EchoTool));
        assert_eq!(registry.tool_count(), 1);
        assert!(registry.get_tool("echo").is_some());
        assert!(registry.get_tool("nonexistent").is_none());

        assert!(registry.remove_tool("echo").is_some());
        assert_eq!(registry.tool_count(), 0);
    }

    #[tokio::test]
    async fn test_call_dispatches_valid_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(EchoTool));

        let out = registry.call("echo", json!({"text": "hello"})).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_call_rejects_schema_violations() {
        let mut registry = ToolRegistry::new();
        registry.register_tool(Arc::new(EchoTool));

        let err = registry.call("echo", json!({"text": 5})).await.unwrap_err();
        assert!(err.to_string().contains("Invalid arguments"));

        let err = registry.call("echo", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("text"));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.call("missing", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
