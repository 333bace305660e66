//! Deployment error taxonomy

use crate::core::config::MessageKey;
use crate::core::step::StageKind;
use crate::git::GitError;
use crate::notify::NotifyError;
use crate::restart::RestartError;
use crate::runner::RunnerError;
use thiserror::Error;

/// Why a deployment stage failed
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("repository update failed: {0}")]
    GitUpdate(#[from] GitError),

    #[error("virtualenv creation failed: {reason}")]
    EnvironmentBuild { reason: String },

    #[error("requirements installation failed: {reason}")]
    DependencyInstall { reason: String },

    #[error("tests failed: {reason}")]
    Test { reason: String },

    #[error("cannot read coverage: {reason}")]
    CoverageParse { reason: String },

    #[error("coverage {coverage}% is below the required {minimum}%")]
    CoverageBelowThreshold { coverage: f64, minimum: f64 },

    #[error("bot restart failed: {0}")]
    Restart(#[from] RestartError),

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    #[error("{stage} could not run a command: {source}")]
    Command {
        stage: StageKind,
        #[source]
        source: RunnerError,
    },
}

impl DeployError {
    /// Message sent to the operator for this failure
    ///
    /// Notification failures have no message of their own.
    pub fn message_key(&self) -> Option<MessageKey> {
        match self {
            DeployError::GitUpdate(_) => Some(MessageKey::UpdateFail),
            DeployError::EnvironmentBuild { .. } => Some(MessageKey::CreateVirtualenvFail),
            DeployError::DependencyInstall { .. } => Some(MessageKey::InstallRequirementsFail),
            DeployError::Test { .. } => Some(MessageKey::RunTestsFail),
            DeployError::CoverageParse { .. } => Some(MessageKey::CoverageFail),
            DeployError::CoverageBelowThreshold { .. } => Some(MessageKey::CoverageLow),
            DeployError::Restart(_) => Some(MessageKey::RestartFail),
            DeployError::Notify(_) => None,
            DeployError::Command { stage, .. } => Some(stage.failure_message()),
        }
    }
}
