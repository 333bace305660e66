//! Repository update
//!
//! Brings the local checkout to the deploy target: the tip of
//! `origin/<branch>`, or the newest tag reachable from it when tags are
//! tracked. All git access goes through the [`CommandRunner`].

use crate::core::config::DeployConfig;
use crate::runner::{CommandOutput, CommandRunner, Invocation, RunnerError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for repository updates
#[derive(Debug, Error)]
pub enum GitError {
    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("missing origin/{branch}")]
    MissingBranch { branch: String },

    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// The checkout after a successful update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoUpdate {
    /// Version before the update, `None` for a fresh clone
    pub old_version: Option<String>,

    /// Version now checked out
    pub version: String,

    /// Author of the checked out commit
    pub author: String,

    /// Ref the checkout was reset to
    pub target: String,

    /// Whether the checkout moved (a fresh clone always counts)
    pub changed: bool,
}

/// Result of looking for something to deploy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The checkout is at the deploy target
    Updated(RepoUpdate),

    /// The checkout already matched the target and only changes are deployed
    Unchanged { version: String },

    /// Tags are tracked but the branch has none
    NoTag,
}

/// Updates the local checkout with git
pub struct GitUpdater<R: CommandRunner> {
    runner: Arc<R>,
    repo_url: String,
    path: PathBuf,
    branch: String,
    ssh_command: Option<String>,
    track_tags: bool,
    only_on_change: bool,
    force: bool,
}

impl<R: CommandRunner> GitUpdater<R> {
    pub fn new(runner: Arc<R>, config: &DeployConfig) -> Self {
        Self {
            runner,
            repo_url: config.repo_url.clone(),
            path: config.repo_path.clone(),
            branch: config.branch.clone(),
            ssh_command: config.git_ssh_command(),
            track_tags: config.track_tags,
            only_on_change: config.only_on_change,
            force: config.force,
        }
    }

    /// Clone or fetch, then reset the checkout to the deploy target
    pub async fn update(&self) -> Result<UpdateOutcome, GitError> {
        let fresh = !self.path.exists();
        let old_version = if fresh {
            self.clone_repository().await?;
            None
        } else {
            let old = self.describe("HEAD").await;
            self.git(["fetch", "origin", "--tags", "--force", "--prune"])
                .await?;
            old
        };

        let remote = format!("origin/{}", self.branch);
        let verify = self
            .try_git(["rev-parse", "--verify", "--quiet", &format!("{}^{{commit}}", remote)])
            .await?;
        if !verify.success() {
            return Err(GitError::MissingBranch {
                branch: self.branch.clone(),
            });
        }

        let target = if self.track_tags {
            let tag = self
                .try_git(["describe", "--tags", "--abbrev=0", &remote])
                .await?;
            if !tag.success() || tag.first_line().is_empty() {
                info!("No tag reachable from {}", remote);
                return Ok(UpdateOutcome::NoTag);
            }
            tag.first_line().to_string()
        } else {
            remote
        };

        let changed = fresh || self.head_differs_from(&target).await?;
        if !changed && self.only_on_change && !self.force {
            let version = old_version.unwrap_or_else(|| target.clone());
            info!("Checkout already at {}, nothing to deploy", version);
            return Ok(UpdateOutcome::Unchanged { version });
        }

        self.git(["reset", "--hard", &target]).await?;

        let version = self
            .git(["describe", "--tags", "--always", &target])
            .await?
            .first_line()
            .to_string();
        let author = self
            .git(["log", "-1", "--format=%an", &target])
            .await?
            .first_line()
            .to_string();

        info!(
            "Checkout at {} by {} (previously {})",
            version,
            author,
            old_version.as_deref().unwrap_or("nothing")
        );

        Ok(UpdateOutcome::Updated(RepoUpdate {
            old_version,
            version,
            author,
            target,
            changed,
        }))
    }

    async fn clone_repository(&self) -> Result<(), GitError> {
        info!("Cloning {} into {}", self.repo_url, self.path.display());

        let path = self.path.to_string_lossy().into_owned();
        let invocation = self.with_ssh(Invocation::new("git").args([
            "clone",
            "--branch",
            &self.branch,
            &self.repo_url,
            &path,
        ]));

        let output = self.runner.run(&invocation).await?;
        if output.success() {
            Ok(())
        } else {
            Err(GitError::Command {
                command: invocation.command_line(),
                reason: output.failure_reason(),
            })
        }
    }

    /// `git describe` of `rev`, `None` when it cannot be described
    async fn describe(&self, rev: &str) -> Option<String> {
        match self.try_git(["describe", "--tags", "--always", rev]).await {
            Ok(output) if output.success() && !output.first_line().is_empty() => {
                Some(output.first_line().to_string())
            }
            Ok(output) => {
                warn!("Cannot describe {}: {}", rev, output.failure_reason());
                None
            }
            Err(e) => {
                warn!("Cannot describe {}: {}", rev, e);
                None
            }
        }
    }

    async fn head_differs_from(&self, target: &str) -> Result<bool, GitError> {
        let head = self.try_git(["rev-parse", "HEAD"]).await?;
        if !head.success() {
            debug!("HEAD does not resolve, treating checkout as changed");
            return Ok(true);
        }
        let target = self
            .git(["rev-parse", &format!("{}^{{commit}}", target)])
            .await?;
        Ok(head.first_line() != target.first_line())
    }

    fn with_ssh(&self, invocation: Invocation) -> Invocation {
        match &self.ssh_command {
            Some(ssh) => invocation.env("GIT_SSH_COMMAND", ssh.as_str()),
            None => invocation,
        }
    }

    fn invocation<'a, I>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.with_ssh(
            Invocation::new("git")
                .args(args)
                .current_dir(self.path.clone()),
        )
    }

    /// Run git in the checkout; non-zero exit is returned, not an error
    async fn try_git<'a, I>(&self, args: I) -> Result<CommandOutput, GitError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Ok(self.runner.run(&self.invocation(args)).await?)
    }

    /// Run git in the checkout; non-zero exit is an error
    async fn git<'a, I>(&self, args: I) -> Result<CommandOutput, GitError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let invocation = self.invocation(args);
        let output = self.runner.run(&invocation).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(GitError::Command {
                command: invocation.command_line(),
                reason: output.failure_reason(),
            })
        }
    }
}
