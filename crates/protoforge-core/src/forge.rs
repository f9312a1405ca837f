//! The prototype forge: provision a workspace, run the script, report back.

use std::sync::Arc;

use crate::config::ForgeConfig;
use crate::errors::ForgeError;
use crate::executors::{RunExecutor, ScriptExecutor};
use crate::report::Report;
use crate::workspace::WorkspaceManager;

/// Entry point shared by the tool binding and the CLI.
///
/// Cheap to share behind an `Arc`; concurrent calls each get their own
/// workspace and child process.
pub struct PrototypeForge {
    workspaces: WorkspaceManager,
    executor: Arc<dyn ScriptExecutor>,
}

impl PrototypeForge {
    pub fn new(config: &ForgeConfig) -> Result<Self, ForgeError> {
        let workspaces = WorkspaceManager::new(&config.workspace)?;
        let executor = Arc::new(RunExecutor::new(&config.execution));
        Ok(Self::with_executor(workspaces, executor))
    }

    pub fn with_executor(workspaces: WorkspaceManager, executor: Arc<dyn ScriptExecutor>) -> Self {
        Self {
            workspaces,
            executor,
        }
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Only workspace provisioning can fail; everything after that is
    /// reported through the returned [`Report`].
    pub async fn forge_and_run(&self, code: &str, purpose: &str) -> Result<Report, ForgeError> {
        let paths = self.workspaces.create_workspace(purpose).await?;
        Ok(self.executor.execute(&paths, code).await)
    }
}
