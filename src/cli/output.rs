//! CLI output formatting

use crate::{
    core::{config::DeployConfig, ExecutionStatus, StageState},
    execution::ExecutionEvent,
};
use console::{Emoji, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Spinner shown while a stage runs; hidden when stdout is not a terminal
pub fn create_spinner() -> ProgressBar {
    if !Term::stdout().is_term() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a stage state for display
pub fn format_stage_state(state: &StageState) -> String {
    match state {
        StageState::Pending => style("PENDING").dim().to_string(),
        StageState::Running { .. } => style("RUNNING").yellow().to_string(),
        StageState::Completed { .. } => style("COMPLETED").green().to_string(),
        StageState::Failed { .. } => style("FAILED").red().to_string(),
        StageState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("DEPLOYED").green().to_string(),
        ExecutionStatus::UpToDate => style("UP TO DATE").cyan().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
        } => format!(
            "{} Deploying {} ({})",
            ROCKET,
            style(pipeline_name).bold(),
            style(&execution_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StageStarted { stage } => {
            format!("{} {}", SPINNER, style(stage.description()).cyan())
        }
        ExecutionEvent::StageCompleted { stage, output } => {
            if output.is_empty() {
                format!("{} {}", CHECK, style(stage).green())
            } else {
                format!("{} {}: {}", CHECK, style(stage).green(), style(output).dim())
            }
        }
        ExecutionEvent::StageSkipped { stage, reason } => {
            format!("{} {} ({})", SKIP, style(stage).dim(), reason)
        }
        ExecutionEvent::StageFailed { stage, error } => {
            format!("{} {}: {}", CROSS, style(stage).red(), style(error).dim())
        }
        ExecutionEvent::Halted { reason, .. } => {
            format!("{} Nothing to deploy: {}", INFO, style(reason).cyan())
        }
        ExecutionEvent::NotificationSent { key } => {
            format!("{} Sent {:?} notification", INFO, key)
        }
        ExecutionEvent::NotificationFailed { key, error } => {
            format!("{} {:?} notification not sent: {}", WARN, key, style(error).yellow())
        }
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        } => format!(
            "{} Deployment ({}) {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}

/// Human readable summary of a resolved configuration
pub fn format_config(config: &DeployConfig) -> String {
    let mut lines = vec![
        format!("  Repository: {}", style(&config.repo_url).bold()),
        format!("  Checkout: {} ({})", config.repo_path.display(), style(&config.branch).cyan()),
        format!("  PID file: {}", config.pid_file.display()),
        format!("  Virtualenv: {}", config.commands.create_virtualenv),
        format!("  Install: {}", config.commands.install_requirements),
    ];

    if config.skip_tests {
        lines.push(format!("  Tests: {}", style("skipped").yellow()));
    } else {
        lines.push(format!("  Tests: {}", config.commands.run_tests));
    }
    if config.skip_tests || config.skip_coverage {
        lines.push(format!("  Coverage: {}", style("skipped").yellow()));
    } else {
        lines.push(format!(
            "  Coverage: {} (minimum {}%)",
            config.commands.get_coverage, config.min_coverage
        ));
    }
    lines.push(format!("  Run: {}", config.commands.run_bot));

    let telegram = if config.telegram.is_enabled() {
        style(format!("{} chat(s)", config.telegram.chat_ids.len())).green().to_string()
    } else {
        style("disabled").yellow().to_string()
    };
    lines.push(format!("  Notifications: {}", telegram));

    lines.join("\n")
}
