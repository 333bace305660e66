//! Deployment stage model

use crate::core::{config::MessageKey, state::DeployPhase, state::StageState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed stages of a deployment, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Update,
    CreateEnvironment,
    InstallDependencies,
    RunTests,
    CheckCoverage,
    Restart,
}

impl StageKind {
    pub const ALL: [StageKind; 6] = [
        StageKind::Update,
        StageKind::CreateEnvironment,
        StageKind::InstallDependencies,
        StageKind::RunTests,
        StageKind::CheckCoverage,
        StageKind::Restart,
    ];

    /// Short name used in logs and templates
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Update => "update",
            StageKind::CreateEnvironment => "create_virtualenv",
            StageKind::InstallDependencies => "install_requirements",
            StageKind::RunTests => "run_tests",
            StageKind::CheckCoverage => "check_coverage",
            StageKind::Restart => "restart",
        }
    }

    /// Human readable description
    pub fn description(&self) -> &'static str {
        match self {
            StageKind::Update => "Updating repository",
            StageKind::CreateEnvironment => "Creating virtualenv",
            StageKind::InstallDependencies => "Installing requirements",
            StageKind::RunTests => "Running tests",
            StageKind::CheckCoverage => "Checking coverage",
            StageKind::Restart => "Restarting bot",
        }
    }

    /// Phase the deployment is in while this stage runs
    pub fn phase(&self) -> DeployPhase {
        match self {
            StageKind::Update => DeployPhase::Updating,
            StageKind::CreateEnvironment => DeployPhase::Building,
            StageKind::InstallDependencies => DeployPhase::Installing,
            StageKind::RunTests => DeployPhase::Testing,
            StageKind::CheckCoverage => DeployPhase::CheckingCoverage,
            StageKind::Restart => DeployPhase::Restarting,
        }
    }

    /// Message sent when a command of this stage fails to run
    pub fn failure_message(&self) -> MessageKey {
        match self {
            StageKind::Update => MessageKey::UpdateFail,
            StageKind::CreateEnvironment => MessageKey::CreateVirtualenvFail,
            StageKind::InstallDependencies => MessageKey::InstallRequirementsFail,
            StageKind::RunTests => MessageKey::RunTestsFail,
            StageKind::CheckCoverage => MessageKey::CoverageFail,
            StageKind::Restart => MessageKey::RestartFail,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage in a deployment pipeline together with its runtime state
#[derive(Debug, Clone)]
pub struct Stage {
    pub kind: StageKind,
    pub state: StageState,
}

impl Stage {
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            state: StageState::Pending,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}
