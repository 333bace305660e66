//! Subprocess runner - executes commands directly, without a shell

use crate::runner::{CommandOutput, CommandRunner, Invocation, RunnerConfig, RunnerError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runner that spawns real processes with `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    config: RunnerConfig,
}

impl ShellRunner {
    /// Create a new runner
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let cwd = invocation.cwd.as_deref().map(absolute_dir);
        let program = resolve_program(&invocation.program, cwd.as_deref());
        let mut command = Command::new(program);
        command.args(&invocation.args);

        if let Some(cwd) = &cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &invocation.env {
            command.env(key, value);
        }

        command
    }
}

/// A relative working directory would otherwise be applied twice: once when
/// the program path is resolved and again by the child's `chdir`.
fn absolute_dir(dir: &Path) -> PathBuf {
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// Relative program paths such as `.virtualenv/bin/pip` are resolved against
/// the invocation's working directory; bare names go through `PATH`.
fn resolve_program(program: &str, cwd: Option<&Path>) -> PathBuf {
    let path = Path::new(program);
    match cwd {
        Some(dir) if path.is_relative() && path.components().count() > 1 => dir.join(path),
        _ => path.to_path_buf(),
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    /// Run a command and capture stdout/stderr
    ///
    /// # Errors
    /// Returns `RunnerError` if:
    /// - The program cannot be spawned
    /// - The configured timeout elapses (the process is killed)
    ///
    /// A non-zero exit status is returned as a normal [`CommandOutput`].
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, RunnerError> {
        debug!("Running `{}`", invocation);

        let mut command = self.command(invocation);
        command.stdin(Stdio::null()).kill_on_drop(true);

        let output = match self.config.timeout_secs {
            Some(secs) => timeout(Duration::from_secs(secs), command.output())
                .await
                .map_err(|_| RunnerError::Timeout {
                    command: invocation.command_line(),
                    secs,
                })?,
            None => command.output().await,
        }
        .map_err(|source| RunnerError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if result.success() {
            debug!("`{}` returned {} bytes of output", invocation, result.stdout.len());
        } else {
            warn!("`{}` failed with {}", invocation, result.failure_reason());
        }

        Ok(result)
    }

    async fn spawn(&self, invocation: &Invocation) -> Result<u32, RunnerError> {
        debug!("Launching `{}`", invocation);

        let mut command = self.command(invocation);
        command.stdin(Stdio::null());
        // Keep the bot out of our process group so signals aimed at this
        // run (e.g. cron killing a stuck job) do not reach it.
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| RunnerError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        child.id().ok_or_else(|| {
            RunnerError::Internal(format!("`{}` exited before its PID was read", invocation))
        })
    }
}
