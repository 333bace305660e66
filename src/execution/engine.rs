//! Main execution engine - orchestrates a deployment run

use crate::{
    core::{
        config::{DeployConfig, MessageKey, MessageTemplates},
        ExecutionStatus, Pipeline, ReleaseContext, StageKind, StageState,
    },
    execution::{DeployError, StageExecutor, StageOutcome},
    notify::Notifier,
    runner::CommandRunner,
};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Events that can occur during a deployment
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
    },
    StageStarted {
        stage: StageKind,
    },
    StageCompleted {
        stage: StageKind,
        output: String,
    },
    StageSkipped {
        stage: StageKind,
        reason: String,
    },
    StageFailed {
        stage: StageKind,
        error: String,
    },
    Halted {
        stage: StageKind,
        reason: String,
    },
    NotificationSent {
        key: MessageKey,
    },
    NotificationFailed {
        key: MessageKey,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs the stages of a [`Pipeline`] in order and reports the outcome
pub struct DeployEngine<R: CommandRunner> {
    executor: StageExecutor<R>,
    notifier: Arc<dyn Notifier>,
    messages: MessageTemplates,
    event_handlers: Mutex<Vec<EventHandler>>,
}

impl<R: CommandRunner> DeployEngine<R> {
    pub fn new(runner: Arc<R>, config: DeployConfig, notifier: Arc<dyn Notifier>) -> Self {
        let messages = config.messages.clone();
        Self {
            executor: StageExecutor::new(runner, config),
            notifier,
            messages,
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.event_handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        let handlers = match self.event_handlers.lock() {
            Ok(handlers) => handlers.clone(),
            Err(_) => return,
        };
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the whole deployment
    ///
    /// Stops at the first failing stage: its message is sent, later stages
    /// stay pending and the error is returned. A stage that finds nothing to
    /// deploy ends the run early as [`ExecutionStatus::UpToDate`].
    pub async fn execute(&self, pipeline: &mut Pipeline) -> Result<ExecutionStatus, DeployError> {
        let execution_id = pipeline.state.execution_id;

        info!("Starting deployment: {} ({})", pipeline.name, execution_id);
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
        });

        pipeline.state.start(pipeline.stages.len());

        for stage in pipeline.execution_order() {
            pipeline.state.advance(stage.phase());
            let started_at = Utc::now();
            self.set_state(pipeline, stage, StageState::Running { started_at });
            self.emit_event(ExecutionEvent::StageStarted { stage });

            match self.executor.execute(stage, &mut pipeline.context).await {
                Ok(StageOutcome::Completed { output }) => {
                    info!("Stage {} completed: {}", stage, output);
                    self.set_state(
                        pipeline,
                        stage,
                        StageState::Completed {
                            output: output.clone(),
                            started_at,
                            completed_at: Utc::now(),
                        },
                    );
                    pipeline.state.finished_stages += 1;
                    self.emit_event(ExecutionEvent::StageCompleted { stage, output });
                }
                Ok(StageOutcome::Skipped { reason }) => {
                    info!("Stage {} skipped: {}", stage, reason);
                    self.set_state(
                        pipeline,
                        stage,
                        StageState::Skipped {
                            reason: reason.clone(),
                        },
                    );
                    pipeline.state.finished_stages += 1;
                    self.emit_event(ExecutionEvent::StageSkipped { stage, reason });
                }
                Ok(StageOutcome::Halt { reason }) => {
                    info!("Nothing to deploy: {}", reason);
                    self.set_state(
                        pipeline,
                        stage,
                        StageState::Completed {
                            output: reason.clone(),
                            started_at,
                            completed_at: Utc::now(),
                        },
                    );
                    let skipped = pipeline.skip_remaining(&reason);
                    pipeline.state.finished_stages += 1 + skipped.len();
                    pipeline.state.up_to_date();
                    self.emit_event(ExecutionEvent::Halted { stage, reason });
                    return Ok(self.finish(pipeline));
                }
                Err(err) => {
                    error!("Stage {} failed: {}", stage, err);
                    self.set_state(
                        pipeline,
                        stage,
                        StageState::Failed {
                            error: err.to_string(),
                            started_at,
                            failed_at: Utc::now(),
                        },
                    );
                    pipeline.state.fail(stage);
                    pipeline.context.stage = Some(stage);
                    pipeline.context.error = Some(err.to_string());
                    self.emit_event(ExecutionEvent::StageFailed {
                        stage,
                        error: err.to_string(),
                    });

                    if let Some(key) = err.message_key() {
                        self.notify(key, &pipeline.context).await;
                    }
                    self.finish(pipeline);
                    return Err(err);
                }
            }
        }

        pipeline.state.complete();
        self.notify(MessageKey::NewVersion, &pipeline.context).await;
        Ok(self.finish(pipeline))
    }

    fn set_state(&self, pipeline: &mut Pipeline, stage: StageKind, state: StageState) {
        if let Some(s) = pipeline.stage_mut(stage) {
            s.state = state;
        }
    }

    fn finish(&self, pipeline: &Pipeline) -> ExecutionStatus {
        let status = pipeline.state.status;
        info!("Deployment finished: {} - {:?}", pipeline.name, status);
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id: pipeline.state.execution_id,
            status,
        });
        status
    }

    /// Render and send a message; failures are logged, never propagated
    async fn notify(&self, key: MessageKey, context: &ReleaseContext) {
        let Some(template) = self.messages.get(key) else {
            debug!("No message configured for {:?}", key);
            return;
        };

        let text = context.render(template);
        match self.notifier.notify(&text).await {
            Ok(()) => self.emit_event(ExecutionEvent::NotificationSent { key }),
            Err(e) => {
                let err = DeployError::from(e);
                warn!("{}", err);
                self.emit_event(ExecutionEvent::NotificationFailed {
                    key,
                    error: err.to_string(),
                });
            }
        }
    }
}
