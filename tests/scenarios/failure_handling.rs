//! Test: Failure Handling - the first failing stage stops the run

use crate::helpers::*;
use bot_ci::core::{DeployPhase, ExecutionStatus, StageKind, StageState};
use bot_ci::execution::DeployError;
use bot_ci::runner::CommandOutput;

#[tokio::test]
async fn test_git_failure_stops_everything() {
    let fixture = Fixture::new();
    fixture.runner.on(
        "git fetch",
        CommandOutput::failed(128, "fatal: Could not read from remote repository."),
    );

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::GitUpdate(_)));
    assert_eq!(run.status(), ExecutionStatus::Failed);
    assert_eq!(
        run.pipeline.state.phase,
        DeployPhase::Failed(StageKind::Update)
    );
    assert!(matches!(run.stage_state(StageKind::Update), StageState::Failed { .. }));
    assert_stopped_after(&run, StageKind::Update);

    assert!(!fixture.runner.ran("git reset"));
    assert!(!fixture.runner.ran("python3"));
    assert!(!fixture.runner.ran(".virtualenv/"));
    assert!(!fixture.runner.ran("kill"));
    assert!(fixture.runner.spawned().is_empty());

    assert_eq!(
        fixture.notifier.messages(),
        vec!["Error during repository update for version unknown!"]
    );
}

#[tokio::test]
async fn test_missing_branch() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on("git rev-parse --verify", CommandOutput::failed(1, ""));
    let config = fixture.config(|s| s.branch = Some("release".to_string()));

    let run = fixture.run(config).await;

    assert!(run.error().to_string().contains("missing origin/release"));
    assert_eq!(fixture.notifier.messages().len(), 1);
}

#[tokio::test]
async fn test_virtualenv_failure() {
    let fixture = Fixture::new();
    fixture.runner.on(
        "python3 -m venv",
        CommandOutput::failed(1, "Error: ensurepip is not available"),
    );

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::EnvironmentBuild { reason } if reason.contains("ensurepip")));
    assert_stopped_after(&run, StageKind::CreateEnvironment);
    assert_eq!(
        fixture.notifier.messages(),
        vec!["Error during virtualenv creation for version v1.1.0!"]
    );
}

#[tokio::test]
async fn test_install_failure() {
    let fixture = Fixture::new();
    fixture.runner.on(
        ".virtualenv/bin/pip",
        CommandOutput::failed(1, "ERROR: No matching distribution found for aiogram==99"),
    );

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::DependencyInstall { .. }));
    assert_stopped_after(&run, StageKind::InstallDependencies);
    assert!(!fixture.runner.ran(".virtualenv/bin/pytest"));
    assert_eq!(
        fixture.notifier.messages(),
        vec!["Error during install requirements for version v1.1.0!"]
    );
}

#[tokio::test]
async fn test_failing_tests_do_not_restart() {
    let fixture = Fixture::new();
    fixture.runner.on(
        ".virtualenv/bin/pytest",
        CommandOutput {
            status: Some(1),
            stdout: "FAILED tests/test_bot.py::test_start - AssertionError\n==== 1 failed ====".to_string(),
            stderr: String::new(),
        },
    );

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::Test { reason } if reason.contains("1 failed")));
    assert_stopped_after(&run, StageKind::RunTests);
    assert!(fixture.runner.spawned().is_empty());
    assert_eq!(fixture.read_pid(), None);
    assert_eq!(
        fixture.notifier.messages(),
        vec!["Error during tests run for version v1.1.0!"]
    );
}

#[tokio::test]
async fn test_failure_message_can_use_error_and_stage() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/pytest", CommandOutput::failed(2, "usage error"));
    let config = fixture.config(|s| {
        s.msg_run_tests_fail = Some("{{ stage }} broke {{ version }}: {{ error }}".to_string());
    });

    fixture.run(config).await;

    assert_eq!(
        fixture.notifier.messages(),
        vec!["run_tests broke v1.1.0: tests failed: exit status 2: usage error"]
    );
}

#[tokio::test]
async fn test_disabled_failure_message_still_fails() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/pytest", CommandOutput::failed(1, ""));
    let config = fixture.config(|s| s.msg_run_tests_fail = Some(String::new()));

    let run = fixture.run(config).await;

    assert!(matches!(run.error(), DeployError::Test { .. }));
    assert!(fixture.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_skip_tests_skips_coverage() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/pytest", CommandOutput::failed(1, "would fail"));
    let config = fixture.config(|s| s.skip_tests = Some(true));

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(matches!(run.stage_state(StageKind::RunTests), StageState::Skipped { .. }));
    assert!(matches!(run.stage_state(StageKind::CheckCoverage), StageState::Skipped { .. }));
    assert!(!fixture.runner.ran(".virtualenv/bin/pytest"));
    assert!(!fixture.runner.ran(".virtualenv/bin/coverage"));
    assert_eq!(fixture.read_pid(), Some(FIRST_PID));
}
