//! External process runner.
//!
//! Runs one short-lived process to completion and applies the output contract:
//! a zero exit status and a single JSON value on stdout, where an object with an
//! `error` field is still a failure.

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::Semaphore;

use super::InvokeError;
use crate::config::InferenceConfig;

/// Launches external processes, bounded by a concurrency gate and a timeout.
pub struct ProcessInvoker {
    /// Limits the number of live child processes
    permits: Semaphore,
    timeout: Option<Duration>,
    kill_grace: Duration,
}

impl ProcessInvoker {
    pub fn new(max_concurrent: usize, timeout: Option<Duration>, kill_grace: Duration) -> Self {
        Self {
            permits: Semaphore::new(max_concurrent.max(1)),
            timeout,
            kill_grace,
        }
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        let timeout = match config.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self::new(
            config.max_concurrent,
            timeout,
            Duration::from_secs(config.kill_grace_secs),
        )
    }

    /// Run `program` with `args` and return the JSON value it printed.
    ///
    /// Waits for a free slot first; the slot is held until the process has
    /// exited and both output streams are drained.
    pub async fn run<S: AsRef<OsStr>>(&self, program: &str, args: &[S]) -> Result<Value, InvokeError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| InvokeError::Io(format!("Semaphore error: {}", e)))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout can take down everything the program started
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| InvokeError::Spawn(format!("{}: {}", program, e)))?;
        let pid = child.id();
        tracing::debug!("Spawned inference process {} (pid: {:?})", program, pid);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| InvokeError::Io("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| InvokeError::Io("stderr was not captured".to_string()))?;

        let collected = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, collect(&mut child, stdout, stderr)).await;
                match waited {
                    Ok(collected) => collected,
                    Err(_elapsed) => {
                        tracing::warn!(
                            "Inference process (pid: {:?}) exceeded {:?}, terminating",
                            pid,
                            limit
                        );
                        terminate(&mut child, self.kill_grace).await;
                        return Err(InvokeError::Timeout(limit));
                    }
                }
            }
            None => collect(&mut child, stdout, stderr).await,
        };

        let (status, out, err) = collected.map_err(|e| InvokeError::Io(e.to_string()))?;
        tracing::debug!(
            "Inference process (pid: {:?}) exited with {} ({} bytes stdout, {} bytes stderr)",
            pid,
            status,
            out.len(),
            err.len()
        );

        classify(status.code(), &out, &err)
    }

    #[cfg(test)]
    fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Drain both output streams while waiting for the exit status.
async fn collect(
    child: &mut Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
) -> io::Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let (_, _, status) = tokio::try_join!(
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err),
        child.wait(),
    )?;
    Ok((status, out, err))
}

/// Terminate a process and its descendants: SIGTERM to the process group first
/// on Unix, SIGKILL once the grace period runs out.
async fn terminate(child: &mut Child, grace: Duration) {
    let pid = child.id();
    signal_group(pid, Signal::Terminate);

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(status)) => {
            tracing::debug!("Terminated inference process exited with {}", status);
        }
        Ok(Err(e)) => {
            tracing::warn!("Error waiting for terminated inference process: {}", e);
        }
        Err(_timeout) => {
            tracing::warn!("Inference process didn't stop gracefully, killing");
            let _ = child.kill().await;
        }
    }

    // Descendants may outlive the group leader
    signal_group(pid, Signal::Kill);
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(pid: Option<u32>, signal: Signal) {
    use nix::sys::signal::{killpg, Signal as NixSignal};
    use nix::unistd::Pid;

    let Some(pid) = pid else { return };
    let signal = match signal {
        Signal::Terminate => NixSignal::SIGTERM,
        Signal::Kill => NixSignal::SIGKILL,
    };
    // ESRCH means the whole group is already gone
    if let Err(e) = killpg(Pid::from_raw(pid as i32), signal) {
        if e != nix::errno::Errno::ESRCH {
            tracing::warn!("Failed to send {:?} to process group {}: {}", signal, pid, e);
        }
    }
}

#[cfg(not(unix))]
fn signal_group(_pid: Option<u32>, _signal: Signal) {}

/// Map exit code and captured output onto the invocation contract.
fn classify(code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Result<Value, InvokeError> {
    if code != Some(0) {
        return Err(InvokeError::ProcessFailure {
            code,
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        });
    }

    let text = String::from_utf8_lossy(stdout);
    let value: Value = serde_json::from_str(text.trim()).map_err(|_| {
        InvokeError::OutputDecodeFailure {
            output: text.to_string(),
        }
    })?;

    if let Some(message) = application_error(&value) {
        return Err(InvokeError::ApplicationFailure(message));
    }

    Ok(value)
}

/// The `error` field of a JSON object, if it is set to something meaningful.
fn application_error(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
