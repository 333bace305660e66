//! Bot restart through a PID file
//!
//! The running bot is stopped with `kill -TERM <pid>` and the new process is
//! launched detached from this one. There is no locking: two concurrent runs
//! can race on the PID file.

use crate::core::config::{DeployConfig, ShellCommand};
use crate::runner::{CommandRunner, Invocation, RunnerError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Error types for restarting the bot
#[derive(Debug, Error)]
pub enum RestartError {
    #[error("cannot read PID file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PID file {path} does not contain a PID: {content:?}")]
    InvalidPid { path: PathBuf, content: String },

    #[error("cannot stop process {pid}: {reason}")]
    Terminate { pid: u32, reason: String },

    #[error("cannot launch bot: {0}")]
    Launch(#[source] RunnerError),

    #[error("cannot write PID file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File holding the PID of the running bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The recorded PID, `None` when there is no PID file
    pub fn read(&self) -> Result<Option<u32>, RestartError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RestartError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match content.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(Some(pid)),
            _ => Err(RestartError::InvalidPid {
                path: self.path.clone(),
                content,
            }),
        }
    }

    /// Replace the recorded PID
    pub fn write(&self, pid: u32) -> Result<(), RestartError> {
        std::fs::write(&self.path, format!("{}\n", pid)).map_err(|source| RestartError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Stops the running bot and starts the freshly deployed one
pub struct BotRestarter<R: CommandRunner> {
    runner: Arc<R>,
    pid_file: PidFile,
    command: ShellCommand,
    workdir: PathBuf,
}

impl<R: CommandRunner> BotRestarter<R> {
    pub fn new(runner: Arc<R>, config: &DeployConfig) -> Self {
        Self {
            runner,
            pid_file: PidFile::new(&config.pid_file),
            command: config.commands.run_bot.clone(),
            workdir: config.repo_path.clone(),
        }
    }

    /// Stop the recorded process, if any, and launch the bot; returns the new PID
    pub async fn restart(&self) -> Result<u32, RestartError> {
        match self.pid_file.read()? {
            Some(pid) => self.stop(pid).await?,
            None => info!(
                "No PID file at {}, nothing to stop",
                self.pid_file.path().display()
            ),
        }

        self.start().await
    }

    async fn stop(&self, pid: u32) -> Result<(), RestartError> {
        info!("Stopping bot process {}", pid);

        let invocation = Invocation::new("kill").args(["-TERM".to_string(), pid.to_string()]);
        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| RestartError::Terminate {
                pid,
                reason: e.to_string(),
            })?;

        if output.success() {
            Ok(())
        } else {
            Err(RestartError::Terminate {
                pid,
                reason: output.failure_reason(),
            })
        }
    }

    async fn start(&self) -> Result<u32, RestartError> {
        let invocation = self.command.invocation_in(&self.workdir);
        let pid = self
            .runner
            .spawn(&invocation)
            .await
            .map_err(RestartError::Launch)?;

        self.pid_file.write(pid)?;
        info!("Bot started as process {}", pid);
        debug!("PID recorded in {}", self.pid_file.path().display());

        Ok(pid)
    }
}
