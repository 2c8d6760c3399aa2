// src/exec/process.rs

//! The execution interface and its process-spawning implementation.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Captured result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs a task's command.
///
/// An `Err` means the command could not be run at all (e.g. the binary does
/// not exist). A command that ran and exited non-zero is an `Ok` with that
/// exit code; the caller decides that this is a failure.
pub trait Executor: Send + Sync + 'static {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        arguments: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<ExecOutput>> + Send + 'a>>;
}

impl<X: Executor + ?Sized> Executor for Arc<X> {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        arguments: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<ExecOutput>> + Send + 'a>> {
        (**self).execute(command, arguments)
    }
}

/// Spawns the command as a child process, without a shell, and captures its
/// output.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    working_dir: Option<PathBuf>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run commands from `dir` (normally the agent directory, so relative
    /// file arguments resolve to staged files).
    pub fn with_working_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
        }
    }
}

impl Executor for ProcessExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        arguments: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<ExecOutput>> + Send + 'a>> {
        Box::pin(async move {
            info!(command = %command, ?arguments, "spawning process");

            let mut cmd = Command::new(command);
            cmd.args(arguments)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &self.working_dir {
                cmd.current_dir(dir);
            }

            let output = cmd
                .output()
                .await
                .with_context(|| format!("spawning process '{command}'"))?;

            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

            for line in stderr.lines() {
                debug!(command = %command, "stderr: {}", line);
            }

            let exit_code = output.status.code().unwrap_or(-1);
            debug!(command = %command, exit_code, "process exited");

            Ok(ExecOutput {
                exit_code,
                stdout,
                stderr,
            })
        })
    }
}
