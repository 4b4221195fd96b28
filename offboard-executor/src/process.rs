//! Child-process backend for the offboarding script.
//!
//! Spawns the configured program with a literal argument vector (no shell),
//! captures stdout and stderr, and enforces the per-request timeout.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use offboard_core::ProcessOutcome;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::backend::ScriptBackend;
use crate::{ExecutorError, ScriptConfig};

/// How long to keep reading pipes after the child has gone away.
///
/// A grandchild that inherited stdout can keep the pipe open indefinitely.
const PIPE_DRAIN: Duration = Duration::from_secs(2);

/// Signal reported for a run stopped by the timeout.
pub const TIMEOUT_SIGNAL: &str = "SIGTERM";

/// Runs the offboarding script as a local child process.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    config: ScriptConfig,
}

impl ProcessBackend {
    /// Create a backend for the given script configuration.
    #[must_use]
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    /// The configuration this backend launches.
    #[must_use]
    pub fn config(&self) -> &ScriptConfig {
        &self.config
    }

    fn command(&self, argv: &[String]) -> Command {
        let mut cmd = Command::new(self.config.program());
        cmd.args(self.config.leading_args())
            .args(argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// SIGTERM, wait out the grace period, then force-kill.
    async fn stop(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = child.id().and_then(|p| i32::try_from(p).ok()) {
                if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
                    tracing::warn!(pid, error = %e, "failed to send SIGTERM");
                }
                if tokio::time::timeout(self.config.kill_grace, child.wait()).await.is_ok() {
                    return;
                }
                tracing::warn!(
                    pid,
                    grace_secs = self.config.kill_grace.as_secs(),
                    "script ignored SIGTERM, killing"
                );
            }
        }

        if let Err(e) = child.kill().await {
            tracing::warn!(error = %e, "failed to kill script");
        }
    }
}

#[async_trait]
impl ScriptBackend for ProcessBackend {
    async fn run(&self, argv: &[String], timeout: Duration) -> ProcessOutcome {
        let start = Instant::now();
        let action = argv.first().map_or("", String::as_str);

        let mut child = match self.command(argv).spawn() {
            Ok(c) => c,
            Err(e) => {
                let program = self.config.program().display();
                tracing::error!(%program, action, error = %e, "failed to spawn script");
                return ProcessOutcome::spawn_failed(
                    format!("failed to spawn {program}: {e}"),
                    start.elapsed(),
                );
            }
        };

        let pid = child.id();
        tracing::info!(?pid, action, timeout_secs = timeout.as_secs(), "script started");

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let outcome = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                let stdout = drain(stdout).await;
                let stderr = drain(stderr).await;
                match status.code() {
                    Some(code) => ProcessOutcome::exited(code, stdout, stderr, start.elapsed()),
                    None => {
                        ProcessOutcome::signaled(signal_name(status), stdout, stderr, start.elapsed())
                    }
                }
            }
            Ok(Err(e)) => {
                tracing::error!(?pid, error = %e, "failed to wait for script");
                ProcessOutcome::exited(
                    offboard_core::exit_code::GENERAL_ERROR_CODE,
                    drain(stdout).await,
                    format!("failed to wait for script: {e}"),
                    start.elapsed(),
                )
            }
            Err(_) => {
                tracing::warn!(?pid, action, timeout_secs = timeout.as_secs(), "script timed out");
                self.stop(&mut child).await;
                let stdout = drain(stdout).await;
                let stderr = drain(stderr).await;
                ProcessOutcome::signaled(TIMEOUT_SIGNAL, stdout, stderr, start.elapsed())
            }
        };

        tracing::info!(
            ?pid,
            action,
            exit_code = ?outcome.exit_code(),
            signal = ?outcome.signal(),
            elapsed_ms = outcome.elapsed_ms(),
            "script finished"
        );
        outcome
    }

    async fn health_check(&self) -> Result<(), ExecutorError> {
        if tokio::fs::metadata(&self.config.script_path).await.is_err() {
            return Err(ExecutorError::ScriptNotFound { path: self.config.script_path.clone() });
        }
        if let Some(interpreter) = &self.config.interpreter {
            which_binary(interpreter)?;
        }
        Ok(())
    }
}

/// Output captured from one pipe by a background task.
struct PipeReader {
    handle: JoinHandle<()>,
    captured: Arc<Mutex<Vec<u8>>>,
}

fn spawn_reader<R: AsyncRead + Unpin + Send + 'static>(pipe: R) -> PipeReader {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);
    let handle = tokio::spawn(async move { read_pipe(pipe, &sink).await });
    PipeReader { handle, captured }
}

async fn read_pipe<R: AsyncRead + Unpin>(mut pipe: R, sink: &Mutex<Vec<u8>>) {
    let mut chunk = [0_u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "pipe read ended with error");
                break;
            }
        }
    }
}

/// Wait for a reader to hit EOF, bounded by [`PIPE_DRAIN`]. Whatever was read
/// before the bound is returned either way.
async fn drain(reader: Option<PipeReader>) -> String {
    let Some(PipeReader { mut handle, captured }) = reader else {
        return String::new();
    };
    match tokio::time::timeout(PIPE_DRAIN, &mut handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "pipe reader task failed"),
        Err(_) => {
            handle.abort();
            tracing::warn!("pipe still open after child exit, keeping partial output");
        }
    }
    let bytes = captured.lock().map(|buf| buf.clone()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(unix)]
fn signal_name(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(raw) => nix::sys::signal::Signal::try_from(raw)
            .map_or_else(|_| format!("SIG{raw}"), |sig| sig.as_str().to_owned()),
        None => "UNKNOWN".to_owned(),
    }
}

#[cfg(not(unix))]
fn signal_name(_status: ExitStatus) -> String {
    "UNKNOWN".to_owned()
}

/// Verify a binary exists either at the given path or in `PATH`.
fn which_binary(path: &Path) -> Result<(), ExecutorError> {
    if path.is_absolute() || path.components().count() > 1 {
        if path.exists() {
            return Ok(());
        }
        return Err(ExecutorError::InterpreterNotFound { path: path.to_owned() });
    }

    let found = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(path).exists()))
        .unwrap_or(false);

    if found {
        Ok(())
    } else {
        Err(ExecutorError::InterpreterNotFound { path: path.to_owned() })
    }
}
