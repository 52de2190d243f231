use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::executor::{ExecError, ProcessExecutor, ProcessOutput};

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("sabcmd wrote to stderr: {0}")]
    Stderr(String),

    #[error("sabcmd exited with {}: {stderr}", exit_label(.exit_code))]
    ExitStatus {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("enqueuer is shutting down")]
    Closed,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// How a finished `sabcmd` run is judged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Any stderr output or a non-zero exit is a failure.
    #[default]
    Strict,
    /// Only a non-zero exit is a failure; stderr is logged and ignored.
    ExitCode,
}

impl FailurePolicy {
    pub fn classify(self, output: &ProcessOutput) -> Result<(), EnqueueError> {
        let stderr = output.stderr.trim();
        if !output.success() {
            return Err(EnqueueError::ExitStatus {
                exit_code: output.exit_code,
                stderr: stderr.to_string(),
            });
        }
        if !output.stderr.is_empty() {
            match self {
                FailurePolicy::Strict => return Err(EnqueueError::Stderr(stderr.to_string())),
                FailurePolicy::ExitCode => warn!(stderr = %stderr, "sabcmd succeeded with stderr output"),
            }
        }
        Ok(())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(FailurePolicy::Strict),
            "exit-code" | "exit_code" | "exitcode" => Ok(FailurePolicy::ExitCode),
            _ => Err(format!("unknown failure policy `{s}`, expected `strict` or `exit-code`")),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Strict => f.write_str("strict"),
            FailurePolicy::ExitCode => f.write_str("exit-code"),
        }
    }
}

/// A `sabcmd add --nzb <url>` invocation. The URL stays one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SabCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SabCommand {
    pub fn add_nzb(program: &Path, download_url: &str) -> Self {
        SabCommand {
            program: program.to_path_buf(),
            args: vec![
                "add".to_string(),
                "--nzb".to_string(),
                download_url.to_string(),
            ],
        }
    }
}

impl fmt::Display for SabCommand {
    /// Shell-like rendering for log lines only; never executed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

pub struct Enqueuer {
    executor: Arc<dyn ProcessExecutor>,
    sabcmd_path: PathBuf,
    policy: FailurePolicy,
    permits: Semaphore,
}

impl Enqueuer {
    pub fn new(
        executor: Arc<dyn ProcessExecutor>,
        sabcmd_path: PathBuf,
        policy: FailurePolicy,
        max_concurrent: usize,
    ) -> Enqueuer {
        Enqueuer {
            executor,
            sabcmd_path,
            policy,
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Hand `download_url` to sabcmd and judge the result by the configured
    /// policy. Returns the tool's stdout on success.
    pub async fn enqueue(&self, download_url: &str) -> Result<String, EnqueueError> {
        let command = SabCommand::add_nzb(&self.sabcmd_path, download_url);

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EnqueueError::Closed)?;

        info!(command = %command, "running sabcmd");
        let output = self
            .executor
            .execute(&command.program, &command.args)
            .await?;

        self.policy.classify(&output)?;

        info!(stdout = %output.stdout.trim(), "sabcmd finished");
        Ok(output.stdout)
    }
}
