//! Isolated, time-bounded execution of prototype scripts.
//!
//! Given a self-contained script and a human-readable purpose, this crate
//! provisions a timestamped workspace, runs the script through an external
//! interpreter-bootstrap tool (`uv run` by default) with a hard wall-clock
//! timeout, and reports stdout, stderr, exit status and the artifact files the
//! script wrote to its output directory.
//!
//! # Architecture Overview
//!
//! - **Workspace management**: collision-free run directories under a fixed root
//! - **Execution**: tool resolution, process-group supervision, output capture
//! - **Reports**: structured JSON results plus a plain-text rendering
//! - **Tool binding**: the `forge_and_run` tool and a registry for calling agents
//! - **Configuration system**: YAML configuration with environment overrides

pub mod config;
pub mod errors;
pub mod executors;
pub mod forge;
pub mod report;
pub mod tools;
pub mod workspace;

pub use config::*;
pub use errors::ForgeError;
pub use executors::{RunExecutor, ScriptExecutor};
pub use forge::PrototypeForge;
pub use report::{Report, RunStatus};
pub use tools::{ForgeAndRunTool, ReportFormat, Tool, ToolFactory, ToolMetadata, ToolRegistry};
pub use workspace::{sanitize_purpose, WorkspaceManager, WorkspacePaths};
