//! Child process supervision: timeout, process-group kill, stream capture
//!
//! The child is started in its own process group and owned by a
//! [`ProcessGroupGuard`] for the rest of the call. Whatever path the call
//! takes out of here (normal exit, timeout, error, or the future being
//! dropped), the guard sends SIGKILL to the whole group, so nothing the script
//! spawned outlives the run.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

#[cfg(unix)]
use nix::{
    errno::Errno,
    sys::signal::{killpg, Signal},
    unistd::Pid,
};

/// How long readers may keep draining after the child is gone.
const READER_GRACE: Duration = Duration::from_secs(2);
const READ_CHUNK: usize = 8192;

#[derive(Debug)]
pub(crate) enum ProcessOutcome {
    Exited(ExitStatus),
    TimedOut,
    WaitFailed(String),
}

#[derive(Debug)]
pub(crate) struct CapturedRun {
    pub outcome: ProcessOutcome,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Kills the child's process group when dropped.
pub(crate) struct ProcessGroupGuard {
    #[cfg(unix)]
    pgid: Option<Pid>,
}

impl ProcessGroupGuard {
    #[cfg(unix)]
    pub(crate) fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|p| i32::try_from(p).ok()).map(Pid::from_raw),
        }
    }

    #[cfg(not(unix))]
    pub(crate) fn new(_pid: Option<u32>) -> Self {
        Self {}
    }

    /// Stop signalling the group, once the leader has been reaped and the
    /// pgid may be handed to an unrelated process.
    #[cfg(unix)]
    pub(crate) fn disarm(&mut self) {
        self.pgid = None;
    }

    #[cfg(not(unix))]
    pub(crate) fn disarm(&mut self) {}

    #[cfg(unix)]
    pub(crate) fn kill_group(&self) {
        if let Some(pgid) = self.pgid {
            match killpg(pgid, Signal::SIGKILL) {
                Ok(()) => log::debug!("Sent SIGKILL to process group {}", pgid),
                Err(Errno::ESRCH) => {}
                Err(e) => log::warn!("Failed to kill process group {}: {}", pgid, e),
            }
        }
    }

    // kill_on_drop on the child handle covers the direct child here
    #[cfg(not(unix))]
    pub(crate) fn kill_group(&self) {}
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill_group();
    }
}

/// Spawn `command`, wait at most `timeout`, and collect both output streams.
///
/// Returns `Err` only when the process could not be spawned at all.
pub(crate) async fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> std::io::Result<CapturedRun> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn()?;
    let mut guard = ProcessGroupGuard::new(child.id());

    let stdout = StreamCapture::spawn(child.stdout.take());
    let stderr = StreamCapture::spawn(child.stderr.take());

    let outcome = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            // Background processes the script left behind would otherwise
            // hold the pipes open.
            guard.kill_group();
            ProcessOutcome::Exited(status)
        }
        Ok(Err(e)) => {
            guard.kill_group();
            let _ = child.start_kill();
            ProcessOutcome::WaitFailed(e.to_string())
        }
        Err(_) => {
            log::warn!("Execution timed out after {}s, killing process group", timeout.as_secs());
            guard.kill_group();
            if let Err(e) = child.kill().await {
                log::debug!("Child already gone after group kill: {}", e);
            }
            ProcessOutcome::TimedOut
        }
    };

    // Every path above has already killed the group exactly once.
    guard.disarm();

    let stdout = stdout.finish(READER_GRACE).await;
    let stderr = stderr.finish(READER_GRACE).await;

    Ok(CapturedRun {
        outcome,
        stdout,
        stderr,
    })
}

/// Drains one pipe into a shared buffer so partial output survives an abort.
struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl StreamCapture {
    fn spawn<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let handle = reader.map(|mut reader| {
            let buffer = buffer.clone();
            tokio::spawn(async move {
                let mut chunk = [0u8; READ_CHUNK];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => lock(&buffer).extend_from_slice(&chunk[..n]),
                        Err(e) => {
                            log::debug!("Output stream read failed: {}", e);
                            break;
                        }
                    }
                }
            })
        });
        Self { buffer, handle }
    }

    async fn finish(mut self, grace: Duration) -> Vec<u8> {
        if let Some(mut handle) = self.handle.take() {
            if tokio::time::timeout(grace, &mut handle).await.is_err() {
                log::warn!("Output pipe still open after the process exited, keeping partial output");
                handle.abort();
            }
        }
        std::mem::take(&mut *lock(&self.buffer))
    }
}

fn lock(buffer: &Mutex<Vec<u8>>) -> MutexGuard<'_, Vec<u8>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
