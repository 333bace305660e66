//! Test: Coverage Threshold - parsing and the inclusive minimum

use crate::helpers::*;
use bot_ci::core::{ExecutionStatus, StageKind, StageState};
use bot_ci::execution::DeployError;
use bot_ci::runner::CommandOutput;

#[tokio::test]
async fn test_coverage_equal_to_minimum_passes() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/coverage", CommandOutput::ok("85\n"));
    let config = fixture.config(|s| s.min_coverage = Some(85.0));

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert_eq!(run.pipeline.context.coverage, Some(85.0));
    assert_eq!(fixture.read_pid(), Some(FIRST_PID));
}

#[tokio::test]
async fn test_coverage_just_below_minimum_fails() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/coverage", CommandOutput::ok("84.99\n"));
    let config = fixture.config(|s| s.min_coverage = Some(85.0));

    let run = fixture.run(config).await;

    assert!(matches!(
        run.error(),
        DeployError::CoverageBelowThreshold { coverage, minimum }
            if *coverage == 84.99 && *minimum == 85.0
    ));
    assert_stopped_after(&run, StageKind::CheckCoverage);
    assert!(fixture.runner.spawned().is_empty());
    assert_eq!(
        fixture.notifier.messages(),
        vec!["Coverage too low for version v1.1.0!"]
    );
}

#[tokio::test]
async fn test_default_minimum_is_full_coverage() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/coverage", CommandOutput::ok("99.9\n"));

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::CoverageBelowThreshold { .. }));
}

#[tokio::test]
async fn test_output_without_number() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/coverage", CommandOutput::ok("No data to report.\n"));

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::CoverageParse { .. }));
    assert!(matches!(run.stage_state(StageKind::Restart), StageState::Pending));
    assert!(fixture.runner.spawned().is_empty());
    assert_eq!(
        fixture.notifier.messages(),
        vec!["Error during get coverage run for version v1.1.0!"]
    );
}

#[tokio::test]
async fn test_coverage_command_failure() {
    let fixture = Fixture::new();
    fixture.runner.on(
        ".virtualenv/bin/coverage",
        CommandOutput::failed(1, "No data to report."),
    );

    let run = fixture.run_default().await;

    assert!(matches!(run.error(), DeployError::CoverageParse { .. }));
    assert!(fixture.runner.spawned().is_empty());
}

#[tokio::test]
async fn test_coverage_in_low_message() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/coverage", CommandOutput::ok("75.5%\n"));
    let config = fixture.config(|s| {
        s.min_coverage = Some(80.0);
        s.msg_coverage_low = Some("{{ version }}: {{ coverage }}% < {{ min_coverage }}%".to_string());
    });

    fixture.run(config).await;

    assert_eq!(fixture.notifier.messages(), vec!["v1.1.0: 75.5% < 80%"]);
}

#[tokio::test]
async fn test_skip_coverage() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on(".virtualenv/bin/coverage", CommandOutput::ok("3\n"));
    let config = fixture.config(|s| s.skip_coverage = Some(true));

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(fixture.runner.ran(".virtualenv/bin/pytest"));
    assert!(!fixture.runner.ran(".virtualenv/bin/coverage"));
    assert!(matches!(run.stage_state(StageKind::CheckCoverage), StageState::Skipped { .. }));
}
