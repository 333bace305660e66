//! Execution state models

use crate::core::step::StageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall deployment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Deployment has not started
    Pending,
    /// Deployment is currently running
    Running,
    /// Every stage succeeded and the bot was restarted
    Completed,
    /// The checkout was already current; later stages were skipped
    UpToDate,
    /// A stage failed
    Failed,
}

impl ExecutionStatus {
    /// Whether the run ended without a failed stage
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::UpToDate)
    }
}

/// Where the deployment currently is
///
/// Phases only move forward, or to `Failed`, and never leave a terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployPhase {
    Pending,
    Updating,
    Building,
    Installing,
    Testing,
    CheckingCoverage,
    Restarting,
    Done,
    UpToDate,
    Failed(StageKind),
}

impl DeployPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeployPhase::Done | DeployPhase::UpToDate | DeployPhase::Failed(_)
        )
    }

    fn rank(&self) -> usize {
        match self {
            DeployPhase::Pending => 0,
            DeployPhase::Updating => 1,
            DeployPhase::Building => 2,
            DeployPhase::Installing => 3,
            DeployPhase::Testing => 4,
            DeployPhase::CheckingCoverage => 5,
            DeployPhase::Restarting => 6,
            DeployPhase::Done | DeployPhase::UpToDate | DeployPhase::Failed(_) => 7,
        }
    }

    /// Whether moving from `self` to `next` is allowed
    pub fn can_advance_to(&self, next: DeployPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            DeployPhase::Failed(_) | DeployPhase::UpToDate => true,
            _ => next.rank() > self.rank(),
        }
    }
}

/// State of a single stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageState {
    /// Stage has not run
    Pending,
    /// Stage is currently running
    Running { started_at: DateTime<Utc> },
    /// Stage completed successfully
    Completed {
        output: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Stage failed
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Stage was not needed or was disabled
    Skipped { reason: String },
}

impl StageState {
    /// Check if stage is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageState::Completed { .. } | StageState::Failed { .. } | StageState::Skipped { .. }
        )
    }
}

/// Overall deployment state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Unique execution ID
    pub execution_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// Current phase
    pub phase: DeployPhase,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of stages
    pub total_stages: usize,

    /// Number of stages that finished, completed or skipped
    pub finished_stages: usize,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            phase: DeployPhase::Pending,
            started_at: None,
            completed_at: None,
            total_stages: 0,
            finished_stages: 0,
        }
    }

    /// Mark deployment as started
    pub fn start(&mut self, total_stages: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_stages = total_stages;
        self.finished_stages = 0;
    }

    /// Move to `next` if the transition is allowed; returns whether it was
    pub fn advance(&mut self, next: DeployPhase) -> bool {
        if self.phase.can_advance_to(next) {
            self.phase = next;
            true
        } else {
            false
        }
    }

    /// Mark deployment as completed
    pub fn complete(&mut self) {
        self.advance(DeployPhase::Done);
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark deployment as finished early because nothing changed
    pub fn up_to_date(&mut self) {
        self.advance(DeployPhase::UpToDate);
        self.status = ExecutionStatus::UpToDate;
        self.completed_at = Some(Utc::now());
    }

    /// Mark deployment as failed at `stage`
    pub fn fail(&mut self, stage: StageKind) {
        self.advance(DeployPhase::Failed(stage));
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Calculate progress (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_stages == 0 {
            return 0.0;
        }
        self.finished_stages as f64 / self.total_stages as f64
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
