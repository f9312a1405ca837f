// src/executors/local.rs
use async_trait::async_trait;
use chrono::Local;
use std::collections::HashMap;
use std::process::ExitStatus;
use std::time::{Duration, Instant};
use tokio::fs;

use super::artifacts::collect_artifacts;
use super::process::{run_with_timeout, ProcessOutcome};
use super::runtime::ToolResolver;
use super::ScriptExecutor;
use crate::config::ExecutionConfig;
use crate::errors::ForgeError;
use crate::report::{Report, RunStatus};
use crate::workspace::WorkspacePaths;

/// Runs scripts as local child processes of this service.
#[derive(Debug, Clone)]
pub struct RunExecutor {
    resolver: ToolResolver,
    timeout: Duration,
    output_env_var: String,
    env: HashMap<String, String>,
}

struct RunOutcome {
    status: RunStatus,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    error: Option<String>,
}

impl RunOutcome {
    fn crashed(message: String) -> Self {
        log::warn!("Run crashed: {}", message);
        Self {
            status: RunStatus::Crashed,
            exit_code: None,
            stdout: String::new(),
            stderr: message.clone(),
            error: Some(message),
        }
    }
}

impl RunExecutor {
    pub fn new(config: &ExecutionConfig) -> Self {
        Self {
            resolver: ToolResolver::new(config),
            timeout: Duration::from_secs(config.timeout_seconds),
            output_env_var: config.output_env_var.clone(),
            env: config.env.clone(),
        }
    }

    async fn run(&self, paths: &WorkspacePaths, code: &str) -> RunOutcome {
        if let Err(e) = fs::write(&paths.script_path, code).await {
            return RunOutcome::crashed(format!(
                "Failed to write script {}: {}",
                paths.script_path.display(),
                e
            ));
        }

        let mut cmd = match self.resolver.get_command(&paths.script_path) {
            Ok(cmd) => cmd,
            Err(ForgeError::Launch(message)) => return RunOutcome::crashed(message),
            Err(e) => return RunOutcome::crashed(e.to_string()),
        };
        cmd.current_dir(&paths.root)
            .envs(&self.env)
            .env(&self.output_env_var, &paths.output_dir);

        log::info!(
            "Running {} with '{}' (timeout {}s)",
            paths.run_id,
            self.resolver.program(),
            self.timeout.as_secs()
        );

        let captured = match run_with_timeout(cmd, self.timeout).await {
            Ok(captured) => captured,
            Err(e) => {
                return RunOutcome::crashed(format!(
                    "Failed to launch '{}': {}",
                    self.resolver.program(),
                    e
                ))
            }
        };

        let stdout = String::from_utf8_lossy(&captured.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&captured.stderr).into_owned();

        let (status, exit_code, error) = match captured.outcome {
            ProcessOutcome::Exited(exit) => classify_exit(exit),
            ProcessOutcome::TimedOut => (
                RunStatus::TimedOut,
                None,
                Some(format!("Execution timed out ({}s)", self.timeout.as_secs())),
            ),
            ProcessOutcome::WaitFailed(e) => (
                RunStatus::Crashed,
                None,
                Some(format!("Failed to wait for process: {}", e)),
            ),
        };

        RunOutcome {
            status,
            exit_code,
            stdout,
            stderr,
            error,
        }
    }
}

fn classify_exit(exit: ExitStatus) -> (RunStatus, Option<i32>, Option<String>) {
    if let Some(code) = exit.code() {
        return (RunStatus::Completed, Some(code), None);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = exit.signal() {
            return (
                RunStatus::Crashed,
                None,
                Some(format!("Process terminated by signal {}", signal)),
            );
        }
    }

    (
        RunStatus::Crashed,
        None,
        Some(format!("Process exited abnormally: {}", exit)),
    )
}

#[async_trait]
impl ScriptExecutor for RunExecutor {
    async fn execute(&self, paths: &WorkspacePaths, code: &str) -> Report {
        let started_at = Local::now();
        let clock = Instant::now();

        let outcome = self.run(paths, code).await;
        let artifacts = collect_artifacts(&paths.output_dir).await;
        let duration_seconds = clock.elapsed().as_secs_f64();

        log::info!(
            "Run {} finished: {} (exit code {:?}, {:.2}s, {} artifacts)",
            paths.run_id,
            outcome.status,
            outcome.exit_code,
            duration_seconds,
            artifacts.len()
        );

        Report {
            run_id: paths.run_id.clone(),
            status: outcome.status,
            exit_code: outcome.exit_code,
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            artifacts,
            output_dir: paths.output_dir.clone(),
            workspace_dir: paths.root.clone(),
            script_path: paths.script_path.clone(),
            started_at,
            finished_at: Local::now(),
            duration_seconds,
            error: outcome.error,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::WorkspaceConfig;
    use crate::workspace::WorkspaceManager;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    use tempfile::{tempdir, TempDir};

    fn sh_executor(timeout_seconds: u64) -> RunExecutor {
        RunExecutor::new(&ExecutionConfig {
            program: "sh".to_string(),
            args: Vec::new(),
            timeout_seconds,
            ..Default::default()
        })
    }

    async fn workspace(purpose: &str) -> (TempDir, WorkspacePaths) {
        let tmp = tempdir().unwrap();
        let manager = WorkspaceManager::new(&WorkspaceConfig {
            root: tmp.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        let paths = manager.create_workspace(purpose).await.unwrap();
        (tmp, paths)
    }

    #[tokio::test]
    async fn test_script_written_verbatim() {
        let (_tmp, paths) = workspace("verbatim").await;
        let code = "# /// script\n# dependencies = []\n# ///\necho ok\n";

        let report = sh_executor(10).execute(&paths, code).await;

        assert_eq!(std::fs::read_to_string(&paths.script_path).unwrap(), code);
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.stdout, "ok\n");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_completed() {
        let (_tmp, paths) = workspace("exit three").await;
        let report = sh_executor(10).execute(&paths, "echo failing >&2\nexit 3\n").await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.exit_code, Some(3));
        assert_eq!(report.stderr, "failing\n");
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_environment_and_working_directory() {
        let (_tmp, paths) = workspace("env").await;
        let code = "printf '%s\\n' \"$PROTOTYPE_OUTPUT_DIR\"\npwd -P\n";

        let report = sh_executor(10).execute(&paths, code).await;
        let lines: Vec<&str> = report.stdout.lines().collect();

        assert_eq!(lines[0], paths.output_dir.to_str().unwrap());
        assert_eq!(lines[1], paths.root.to_str().unwrap());
    }

    #[tokio::test]
    async fn test_extra_env_is_passed() {
        let (_tmp, paths) = workspace("extra env").await;
        let mut config = ExecutionConfig {
            program: "sh".to_string(),
            args: Vec::new(),
            ..Default::default()
        };
        config.env.insert("FORGE_GREETING".to_string(), "hi".to_string());

        let report = RunExecutor::new(&config)
            .execute(&paths, "echo \"$FORGE_GREETING\"\n")
            .await;
        assert_eq!(report.stdout, "hi\n");
    }

    #[tokio::test]
    async fn test_artifacts_listed_after_run() {
        let (_tmp, paths) = workspace("artifacts").await;
        let code = "mkdir -p \"$PROTOTYPE_OUTPUT_DIR/charts\"\n\
                    echo 1,2 > \"$PROTOTYPE_OUTPUT_DIR/data.csv\"\n\
                    echo png > \"$PROTOTYPE_OUTPUT_DIR/charts/line.png\"\n";

        let report = sh_executor(10).execute(&paths, code).await;

        assert_eq!(report.artifacts, vec!["charts/line.png", "data.csv"]);
        assert_eq!(report.output_dir, paths.output_dir);
    }

    #[tokio::test]
    async fn test_removed_output_dir_means_no_artifacts() {
        let (_tmp, paths) = workspace("rm outputs").await;
        let report = sh_executor(10)
            .execute(&paths, "rm -rf \"$PROTOTYPE_OUTPUT_DIR\"\n")
            .await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.exit_code, Some(0));
        assert!(report.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let (_tmp, paths) = workspace("sleepy").await;
        let code = "echo $$ > \"$PROTOTYPE_OUTPUT_DIR/pid\"\necho waiting\nexec sleep 30\n";

        let report = sh_executor(1).execute(&paths, code).await;

        assert_eq!(report.status, RunStatus::TimedOut);
        assert_eq!(report.exit_code, None);
        assert_eq!(report.stdout, "waiting\n");
        assert!(report.duration_seconds < 10.0);
        assert!(report.error.as_deref().unwrap().contains("timed out"));

        let pid: i32 = std::fs::read_to_string(paths.output_dir.join("pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(kill(Pid::from_raw(pid), None).is_err(), "process {} still alive", pid);
    }

    #[tokio::test]
    async fn test_signal_death_is_crashed() {
        let (_tmp, paths) = workspace("self kill").await;
        let report = sh_executor(10).execute(&paths, "kill -TERM $$\n").await;

        assert_eq!(report.status, RunStatus::Crashed);
        assert!(report.error.as_deref().unwrap().contains("signal"));
    }

    #[tokio::test]
    async fn test_missing_tool_is_crashed_with_diagnostic() {
        let (_tmp, paths) = workspace("no tool").await;
        let executor = RunExecutor::new(&ExecutionConfig {
            program: "protoforge-missing-runner".to_string(),
            ..Default::default()
        });

        let report = executor.execute(&paths, "print('hi')\n").await;

        assert_eq!(report.status, RunStatus::Crashed);
        assert_eq!(report.exit_code, None);
        assert!(report.stderr.contains("protoforge-missing-runner"));
        assert!(report.error.is_some());
        assert!(report.output_dir.is_dir());
        assert!(report.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_script_path_is_crashed() {
        let (_tmp, mut paths) = workspace("bad script path").await;
        paths.script_path = paths.root.join("missing-dir").join("script.py");

        let report = sh_executor(10).execute(&paths, "echo hi\n").await;
        assert_eq!(report.status, RunStatus::Crashed);
        assert!(report.error.unwrap().contains("Failed to write script"));
    }
}
