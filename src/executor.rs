//! Child-process execution behind a narrow trait, so the enqueue logic can be
//! driven by a fake in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while waiting for {}: {source}", .program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} did not finish within {timeout:?}", .program.display())]
    Timeout { program: PathBuf, timeout: Duration },
}

/// Captured result of one finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    fn from_std(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        ProcessOutput {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
            exit_code: status.code(),
        }
    }
}

#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run `program` with `args` to completion and capture its output.
    ///
    /// Arguments are passed to the program as-is; nothing is interpreted by a
    /// shell.
    async fn execute(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ExecError>;
}

/// Runs commands as real child processes, killing any that outlive `timeout`.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    timeout: Duration,
}

impl TokioExecutor {
    pub fn new(timeout: Duration) -> Self {
        TokioExecutor { timeout }
    }
}

#[async_trait]
impl ProcessExecutor for TokioExecutor {
    async fn execute(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ExecError> {
        debug!(program = %program.display(), ?args, "spawning process");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: program.to_path_buf(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExecError::Timeout {
                program: program.to_path_buf(),
                timeout: self.timeout,
            })?
            .map_err(|source| ExecError::Io {
                program: program.to_path_buf(),
                source,
            })?;

        Ok(ProcessOutput::from_std(
            output.status,
            &output.stdout,
            &output.stderr,
        ))
    }
}
