//! Run reports
//!
//! A `Report` is the snapshot handed back to the caller once a run has reached
//! one of its terminal states. It serializes to the JSON shape consumed by
//! calling agents and can also be rendered as a plain-text summary.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    TimedOut,
    Crashed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Completed => "completed",
            RunStatus::TimedOut => "timed_out",
            RunStatus::Crashed => "crashed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub run_id: String,
    pub status: RunStatus,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Paths relative to `output_dir`, `/`-separated and sorted
    pub artifacts: Vec<String>,
    pub output_dir: PathBuf,
    pub workspace_dir: PathBuf,
    pub script_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed && self.exit_code == Some(0)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary in the layout agents were originally shown.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!("Prototype Directory: {}", self.workspace_dir.display()),
            format!("Status: {}", self.status_line()),
            String::new(),
            "[Standard Output]".to_string(),
            if self.stdout.is_empty() {
                "(No output)".to_string()
            } else {
                self.stdout.clone()
            },
        ];

        if !self.stderr.is_empty() {
            lines.push(String::new());
            lines.push("[Standard Error]".to_string());
            lines.push(self.stderr.clone());
        }

        if !self.artifacts.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "Generated Artifacts in {}: {}",
                self.output_dir.display(),
                self.artifacts.join(", ")
            ));
        }

        lines.join("\n")
    }

    fn status_line(&self) -> String {
        match (self.status, self.exit_code) {
            (RunStatus::Completed, Some(0)) => "Success".to_string(),
            (RunStatus::Completed, Some(code)) => format!("Failed (Exit Code: {})", code),
            (RunStatus::Completed, None) => "Failed".to_string(),
            (RunStatus::TimedOut, _) => self
                .error
                .clone()
                .unwrap_or_else(|| "Execution timed out".to_string()),
            (RunStatus::Crashed, _) => format!(
                "Crashed: {}",
                self.error.as_deref().unwrap_or("unknown failure")
            ),
        }
    }
}
