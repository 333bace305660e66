//! Pipeline domain model

use crate::core::{
    config::DeployConfig,
    context::ReleaseContext,
    state::{PipelineState, StageState},
    step::{Stage, StageKind},
};

/// One deployment run: the ordered stages, their state and what is known
/// about the release
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Name shown in output, derived from the repository URL
    pub name: String,

    /// Stages in execution order
    pub stages: Vec<Stage>,

    /// Execution state
    pub state: PipelineState,

    /// Values for notification templates
    pub context: ReleaseContext,
}

impl Pipeline {
    /// Create the deployment pipeline for a configuration
    pub fn from_config(config: &DeployConfig) -> Self {
        let context = ReleaseContext {
            min_coverage: Some(config.min_coverage),
            ..Default::default()
        };

        Pipeline {
            name: repository_name(&config.repo_url),
            stages: StageKind::ALL.into_iter().map(Stage::new).collect(),
            state: PipelineState::new(),
            context,
        }
    }

    /// Get a stage by kind
    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    /// Get a mutable stage by kind
    pub fn stage_mut(&mut self, kind: StageKind) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.kind == kind)
    }

    /// Stage kinds in execution order
    pub fn execution_order(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind).collect()
    }

    /// Mark every stage that has not run as skipped
    pub fn skip_remaining(&mut self, reason: &str) -> Vec<StageKind> {
        self.stages
            .iter_mut()
            .filter(|s| !s.state.is_terminal())
            .map(|s| {
                s.state = StageState::Skipped {
                    reason: reason.to_string(),
                };
                s.kind
            })
            .collect()
    }

    /// The stage that failed, if any
    pub fn failed_stage(&self) -> Option<StageKind> {
        self.stages
            .iter()
            .find(|s| matches!(s.state, StageState::Failed { .. }))
            .map(|s| s.kind)
    }
}

/// `git@github.com:acme/weather-bot.git` -> `weather-bot`
fn repository_name(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        url.to_string()
    } else {
        name.to_string()
    }
}
