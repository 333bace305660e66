//! Stage executor - runs individual deployment stages

use crate::{
    core::{
        condition::{parse_coverage, CoverageThreshold},
        config::{DeployConfig, ShellCommand},
        ReleaseContext, StageKind,
    },
    execution::DeployError,
    git::{GitUpdater, UpdateOutcome},
    restart::BotRestarter,
    runner::{CommandOutput, CommandRunner},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a stage that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Stage did its work
    Completed { output: String },
    /// Stage was not needed or is disabled
    Skipped { reason: String },
    /// Nothing to deploy; the run ends successfully here
    Halt { reason: String },
}

/// Executes a single stage
pub struct StageExecutor<R: CommandRunner> {
    runner: Arc<R>,
    git: GitUpdater<R>,
    restarter: BotRestarter<R>,
    config: DeployConfig,
}

impl<R: CommandRunner> StageExecutor<R> {
    pub fn new(runner: Arc<R>, config: DeployConfig) -> Self {
        Self {
            git: GitUpdater::new(runner.clone(), &config),
            restarter: BotRestarter::new(runner.clone(), &config),
            runner,
            config,
        }
    }

    /// Execute a stage, recording what it learns in `context`
    pub async fn execute(
        &self,
        stage: StageKind,
        context: &mut ReleaseContext,
    ) -> Result<StageOutcome, DeployError> {
        info!("Executing stage: {}", stage);

        match stage {
            StageKind::Update => self.update(context).await,
            StageKind::CreateEnvironment => self.create_environment().await,
            StageKind::InstallDependencies => self.install_dependencies().await,
            StageKind::RunTests => self.run_tests().await,
            StageKind::CheckCoverage => self.check_coverage(context).await,
            StageKind::Restart => {
                let pid = self.restarter.restart().await?;
                Ok(StageOutcome::Completed {
                    output: format!("bot running as process {}", pid),
                })
            }
        }
    }

    async fn update(&self, context: &mut ReleaseContext) -> Result<StageOutcome, DeployError> {
        match self.git.update().await? {
            UpdateOutcome::Updated(update) => {
                let output = match &update.old_version {
                    Some(old) if update.changed => format!("{} -> {}", old, update.version),
                    _ => update.version.clone(),
                };
                context.version = Some(update.version);
                context.old_version = update.old_version;
                context.author = Some(update.author);
                Ok(StageOutcome::Completed { output })
            }
            UpdateOutcome::Unchanged { version } => {
                context.old_version = Some(version.clone());
                context.version = Some(version.clone());
                Ok(StageOutcome::Halt {
                    reason: format!("already at {}", version),
                })
            }
            UpdateOutcome::NoTag => Ok(StageOutcome::Halt {
                reason: format!("no tag on origin/{}", self.config.branch),
            }),
        }
    }

    async fn create_environment(&self) -> Result<StageOutcome, DeployError> {
        let venv = self.config.virtualenv_dir();
        if venv.exists() {
            debug!("Virtualenv found at {}", venv.display());
            return Ok(StageOutcome::Skipped {
                reason: format!("virtualenv exists at {}", venv.display()),
            });
        }

        let output = self
            .run(StageKind::CreateEnvironment, &self.config.commands.create_virtualenv)
            .await?;
        if !output.success() {
            return Err(DeployError::EnvironmentBuild {
                reason: output.failure_reason(),
            });
        }
        Ok(StageOutcome::Completed {
            output: format!("created {}", venv.display()),
        })
    }

    async fn install_dependencies(&self) -> Result<StageOutcome, DeployError> {
        let output = self
            .run(StageKind::InstallDependencies, &self.config.commands.install_requirements)
            .await?;
        if !output.success() {
            return Err(DeployError::DependencyInstall {
                reason: output.failure_reason(),
            });
        }
        Ok(StageOutcome::Completed {
            output: last_line(&output.stdout),
        })
    }

    async fn run_tests(&self) -> Result<StageOutcome, DeployError> {
        if self.config.skip_tests {
            return Ok(StageOutcome::Skipped {
                reason: "tests disabled".to_string(),
            });
        }

        let output = self
            .run(StageKind::RunTests, &self.config.commands.run_tests)
            .await?;
        if !output.success() {
            return Err(DeployError::Test {
                reason: output.failure_reason(),
            });
        }
        Ok(StageOutcome::Completed {
            output: last_line(&output.stdout),
        })
    }

    async fn check_coverage(&self, context: &mut ReleaseContext) -> Result<StageOutcome, DeployError> {
        if self.config.skip_tests || self.config.skip_coverage {
            return Ok(StageOutcome::Skipped {
                reason: "coverage check disabled".to_string(),
            });
        }

        let output = self
            .run(StageKind::CheckCoverage, &self.config.commands.get_coverage)
            .await?;
        if !output.success() {
            return Err(DeployError::CoverageParse {
                reason: output.failure_reason(),
            });
        }

        let coverage = parse_coverage(&output.stdout).ok_or_else(|| DeployError::CoverageParse {
            reason: format!("no percentage in {:?}", output.stdout.trim()),
        })?;
        context.coverage = Some(coverage);

        let threshold = CoverageThreshold::new(self.config.min_coverage);
        if !threshold.is_met(coverage) {
            warn!("Coverage {}% below minimum {}%", coverage, threshold.minimum);
            return Err(DeployError::CoverageBelowThreshold {
                coverage,
                minimum: threshold.minimum,
            });
        }

        Ok(StageOutcome::Completed {
            output: format!("coverage {}% (minimum {}%)", coverage, threshold.minimum),
        })
    }

    /// Run a configured command in the checkout
    async fn run(&self, stage: StageKind, command: &ShellCommand) -> Result<CommandOutput, DeployError> {
        self.runner
            .run(&command.invocation_in(&self.config.repo_path))
            .await
            .map_err(|source| DeployError::Command { stage, source })
    }
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}
