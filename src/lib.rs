//! bot-ci - continuous deployment for Telegram bots
//!
//! One run updates a git checkout, prepares the virtualenv, runs the tests,
//! checks coverage and restarts the bot, telling the operator on Telegram
//! how it went.

pub mod cli;
pub mod core;
pub mod execution;
pub mod git;
pub mod notify;
pub mod restart;
pub mod runner;

// Re-export commonly used types
pub use core::config::{ConfigError, ConfigSource, DeployConfig, MessageKey};
pub use core::{ExecutionStatus, Pipeline, ReleaseContext, StageKind, StageState};
pub use execution::{DeployEngine, DeployError, ExecutionEvent, StageOutcome};
pub use notify::{Notifier, NotifyError};
pub use runner::{CommandOutput, CommandRunner, Invocation, RunnerError, ShellRunner};
