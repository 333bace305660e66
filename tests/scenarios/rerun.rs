//! Test: Rerun - deploying again over an existing checkout

use crate::helpers::*;
use bot_ci::core::{DeployPhase, ExecutionStatus, StageKind, StageState};
use bot_ci::execution::ExecutionEvent;
use bot_ci::runner::CommandOutput;

#[tokio::test]
async fn test_unchanged_repository_is_redeployed() {
    let fixture = Fixture::new();
    unchanged_repository(&fixture.runner);

    let first = fixture.run_default().await;
    let second = fixture.run_default().await;

    assert_eq!(first.status(), ExecutionStatus::Completed);
    assert_eq!(second.status(), ExecutionStatus::Completed);
    assert_eq!(
        fixture.notifier.messages(),
        vec!["I'm at new version v1.0.0!", "I'm at new version v1.0.0!"]
    );
    assert!(fixture.runner.ran(&format!("kill -TERM {}", FIRST_PID)));
    assert_eq!(fixture.read_pid(), Some(FIRST_PID + 1));
}

#[tokio::test]
async fn test_only_on_change_stops_when_up_to_date() {
    let fixture = Fixture::new();
    unchanged_repository(&fixture.runner);
    let config = fixture.config(|s| s.only_on_change = Some(true));

    let run = fixture.run(config).await;

    assert!(matches!(run.result, Ok(ExecutionStatus::UpToDate)));
    assert_eq!(run.status(), ExecutionStatus::UpToDate);
    assert_eq!(run.pipeline.state.phase, DeployPhase::UpToDate);
    assert!(matches!(run.stage_state(StageKind::Update), StageState::Completed { .. }));
    for kind in &StageKind::ALL[1..] {
        assert!(
            matches!(run.stage_state(*kind), StageState::Skipped { .. }),
            "{} should be skipped",
            kind
        );
    }

    assert!(!fixture.runner.ran("git reset"));
    assert!(!fixture.runner.ran(".virtualenv/bin/pip"));
    assert!(fixture.runner.spawned().is_empty());
    assert!(fixture.notifier.messages().is_empty());
    assert!(run
        .events
        .iter()
        .any(|e| matches!(e, ExecutionEvent::Halted { stage: StageKind::Update, .. })));
}

#[tokio::test]
async fn test_only_on_change_deploys_new_commits() {
    let fixture = Fixture::new();
    let config = fixture.config(|s| s.only_on_change = Some(true));

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert_eq!(fixture.notifier.messages(), vec!["I'm at new version v1.1.0!"]);
}

#[tokio::test]
async fn test_force_overrides_only_on_change() {
    let fixture = Fixture::new();
    unchanged_repository(&fixture.runner);
    let config = fixture.config(|s| {
        s.only_on_change = Some(true);
        s.force = Some(true);
    });

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(fixture.runner.ran("git reset --hard origin/master"));
    assert_eq!(fixture.read_pid(), Some(FIRST_PID));
}

#[tokio::test]
async fn test_tracked_tag_is_deployed() {
    let fixture = Fixture::new();
    fixture
        .runner
        .on("git describe --tags --abbrev=0", CommandOutput::ok("v1.1.0\n"))
        .on("git rev-parse v1.1.0^{commit}", CommandOutput::ok("ccccccc\n"))
        .on("git describe --tags --always v1.1.0", CommandOutput::ok("v1.1.0\n"));
    let config = fixture.config(|s| s.track_tags = Some(true));

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(fixture.runner.ran("git reset --hard v1.1.0"));
    assert!(!fixture.runner.ran("git reset --hard origin/master"));
    assert_eq!(fixture.notifier.messages(), vec!["I'm at new version v1.1.0!"]);
}

#[tokio::test]
async fn test_tracking_tags_without_any_tag() {
    let fixture = Fixture::new();
    fixture.runner.on(
        "git describe --tags --abbrev=0",
        CommandOutput::failed(128, "fatal: No names found, cannot describe anything."),
    );
    let config = fixture.config(|s| s.track_tags = Some(true));

    let run = fixture.run(config).await;

    assert!(matches!(run.result, Ok(ExecutionStatus::UpToDate)));
    assert!(!fixture.runner.ran("git reset"));
    assert!(fixture.runner.spawned().is_empty());
    assert!(fixture.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_fresh_clone() {
    let fixture = Fixture::new();
    std::fs::remove_dir(fixture.repo_path()).unwrap();
    let pid_file = fixture.dir.path().join("bot.pid");
    let config = fixture.config(|s| {
        s.only_on_change = Some(true);
        s.pid_file_path = Some(pid_file.clone());
    });

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(fixture.runner.ran(&format!(
        "git clone --branch master git@github.com:acme/weather-bot.git {}",
        fixture.repo_path().display()
    )));
    assert!(!fixture.runner.ran("git fetch"));
    assert_eq!(std::fs::read_to_string(&pid_file).unwrap().trim(), "1000");
    assert_eq!(
        fixture.notifier.messages(),
        vec!["I'm at new version v1.1.0!"]
    );
}
