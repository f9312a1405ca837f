//! Script execution for prototype runs.
//!
//! Runs a submitted script through an external interpreter-bootstrap tool in
//! its own workspace, bounded by a wall-clock timeout. Executors never fail:
//! launch errors, non-zero exits and timeouts all come back as a [`Report`].

use async_trait::async_trait;

use crate::report::Report;
use crate::workspace::WorkspacePaths;

#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn execute(&self, paths: &WorkspacePaths, code: &str) -> Report;
}

pub mod artifacts;
pub mod local;
pub(crate) mod process;
pub mod runtime;

pub use artifacts::collect_artifacts;
pub use local::RunExecutor;
pub use runtime::ToolResolver;
