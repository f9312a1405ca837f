//! Workspace provisioning for prototype runs
//!
//! Each run gets its own directory under the configured root, named
//! `<YYYYmmdd_HHMMSS>_<sanitized purpose>`. Directories are claimed with an
//! exclusive, non-recursive create: when the name is taken (same second, same
//! purpose) the next numeric suffix is tried, so concurrent callers never end
//! up sharing a directory and no lock is needed.

use chrono::Local;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::WorkspaceConfig;
use crate::errors::ForgeError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const FALLBACK_PURPOSE: &str = "run";
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Paths of one provisioned run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspacePaths {
    pub run_id: String,
    pub root: PathBuf,
    pub script_path: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    script_name: String,
    output_dir_name: String,
    max_purpose_len: usize,
}

impl WorkspaceManager {
    /// Create the root directory (if needed) and pin it to an absolute path.
    pub fn new(config: &WorkspaceConfig) -> Result<Self, ForgeError> {
        std::fs::create_dir_all(&config.root)
            .map_err(|e| ForgeError::provisioning(&config.root, e))?;
        let root = std::fs::canonicalize(&config.root)
            .map_err(|e| ForgeError::provisioning(&config.root, e))?;

        log::debug!("Workspace root: {}", root.display());

        Ok(Self {
            root,
            script_name: config.script_name.clone(),
            output_dir_name: config.output_dir_name.clone(),
            max_purpose_len: config.max_purpose_len,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn create_workspace(&self, purpose: &str) -> Result<WorkspacePaths, ForgeError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let base = format!(
            "{}_{}",
            timestamp,
            sanitize_purpose(purpose, self.max_purpose_len)
        );
        self.create_named(&base).await
    }

    /// Claim `base`, or the first free `base_N`, and lay out the run inside it.
    pub(crate) async fn create_named(&self, base: &str) -> Result<WorkspacePaths, ForgeError> {
        let (run_id, dir) = self.claim_dir(base).await?;

        let output_dir = dir.join(&self.output_dir_name);
        fs::create_dir(&output_dir)
            .await
            .map_err(|e| ForgeError::provisioning(&output_dir, e))?;

        log::info!("Prototype workspace created: {}", dir.display());

        Ok(WorkspacePaths {
            run_id,
            script_path: dir.join(&self.script_name),
            output_dir,
            root: dir,
        })
    }

    async fn claim_dir(&self, base: &str) -> Result<(String, PathBuf), ForgeError> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let name = if attempt == 1 {
                base.to_string()
            } else {
                format!("{}_{}", base, attempt)
            };
            let dir = self.root.join(&name);

            match fs::create_dir(&dir).await {
                Ok(()) => return Ok((name, dir)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    log::debug!("Workspace name {} taken, trying next suffix", name);
                }
                Err(e) => return Err(ForgeError::provisioning(&dir, e)),
            }
        }

        Err(ForgeError::provisioning(
            &self.root.join(base),
            format!("no free workspace name after {} attempts", MAX_NAME_ATTEMPTS),
        ))
    }
}

/// Reduce `purpose` to `[A-Za-z0-9_]`, spaces becoming underscores.
pub fn sanitize_purpose(purpose: &str, max_len: usize) -> String {
    let sanitized: String = purpose
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        FALLBACK_PURPOSE.to_string()
    } else {
        sanitized
    }
}
