//! Test: Success Chain - every stage runs in order and one message is sent

use crate::helpers::*;
use bot_ci::core::{DeployPhase, ExecutionStatus, StageKind, StageState};
use bot_ci::execution::ExecutionEvent;

#[tokio::test]
async fn test_full_deployment() {
    let fixture = Fixture::new();

    let run = fixture.run_default().await;

    assert!(run.result.is_ok(), "deployment failed: {:?}", run.result);
    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert_eq!(run.pipeline.state.phase, DeployPhase::Done);
    assert_eq!(run.pipeline.state.progress(), 1.0);

    for kind in StageKind::ALL {
        assert!(
            matches!(run.stage_state(kind), StageState::Completed { .. }),
            "{} not completed: {:?}",
            kind,
            run.stage_state(kind)
        );
    }

    assert_eq!(fixture.notifier.messages(), vec!["I'm at new version v1.1.0!"]);
    assert_eq!(fixture.read_pid(), Some(FIRST_PID));
}

#[tokio::test]
async fn test_commands_run_in_order() {
    let fixture = Fixture::new();

    fixture.run_default().await;

    let commands = fixture.runner.commands();
    let position = |prefix: &str| {
        commands
            .iter()
            .position(|c| c.starts_with(prefix))
            .unwrap_or_else(|| panic!("`{}` never ran: {:#?}", prefix, commands))
    };

    let order = [
        "git fetch origin --tags --force --prune",
        "git reset --hard origin/master",
        "python3 -m venv .virtualenv",
        ".virtualenv/bin/pip install -r requirements.txt",
        ".virtualenv/bin/pytest --cov=bot",
        ".virtualenv/bin/coverage report --format=total",
    ];
    for pair in order.windows(2) {
        assert!(position(pair[0]) < position(pair[1]), "{} ran after {}", pair[0], pair[1]);
    }

    let spawned = fixture.runner.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].command_line(), ".virtualenv/bin/python bot.py");
    assert_eq!(spawned[0].cwd, Some(fixture.repo_path()));
}

#[tokio::test]
async fn test_stage_commands_run_in_checkout() {
    let fixture = Fixture::new();

    fixture.run_default().await;

    let stage_commands: Vec<_> = fixture
        .runner
        .invocations()
        .into_iter()
        .filter(|i| !i.program.starts_with("git") && i.program != "kill")
        .collect();
    assert_eq!(stage_commands.len(), 4);
    for invocation in stage_commands {
        assert_eq!(invocation.cwd, Some(fixture.repo_path()), "{}", invocation);
    }
}

#[tokio::test]
async fn test_existing_virtualenv_is_reused() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.repo_path().join(".virtualenv")).unwrap();

    let run = fixture.run_default().await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(matches!(
        run.stage_state(StageKind::CreateEnvironment),
        StageState::Skipped { .. }
    ));
    assert!(!fixture.runner.ran("python3 -m venv"));
    assert!(fixture.runner.ran(".virtualenv/bin/pip install"));
}

#[tokio::test]
async fn test_custom_templates_see_release_details() {
    let fixture = Fixture::new();
    let config = fixture.config(|s| {
        s.msg_new_version =
            Some("{{ author }} shipped {{ version }} (was {{ old_version }}, coverage {{ coverage }}%)".to_string());
    });

    fixture.run(config).await;

    assert_eq!(
        fixture.notifier.messages(),
        vec!["Ada shipped v1.1.0 (was v1.0.0, coverage 100%)"]
    );
}

#[tokio::test]
async fn test_disabled_success_message() {
    let fixture = Fixture::new();
    let config = fixture.config(|s| s.msg_new_version = Some(String::new()));

    let run = fixture.run(config).await;

    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert!(fixture.notifier.messages().is_empty());
}

#[tokio::test]
async fn test_events_describe_the_run() {
    let fixture = Fixture::new();

    let run = fixture.run_default().await;

    assert!(matches!(run.events.first(), Some(ExecutionEvent::PipelineStarted { pipeline_name, .. }) if pipeline_name == "weather-bot"));
    assert!(matches!(
        run.events.last(),
        Some(ExecutionEvent::PipelineCompleted {
            status: ExecutionStatus::Completed,
            ..
        })
    ));

    let started: Vec<StageKind> = run
        .events
        .iter()
        .filter_map(|e| match e {
            ExecutionEvent::StageStarted { stage } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(started, StageKind::ALL.to_vec());
    assert!(run
        .events
        .iter()
        .any(|e| matches!(e, ExecutionEvent::NotificationSent { .. })));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_deployment() {
    let fixture = Fixture::new();
    fixture.notifier.fail();

    let run = fixture.run_default().await;

    assert!(run.result.is_ok());
    assert_eq!(run.status(), ExecutionStatus::Completed);
    assert_eq!(fixture.notifier.messages().len(), 1);
    assert!(run
        .events
        .iter()
        .any(|e| matches!(e, ExecutionEvent::NotificationFailed { error, .. } if error.contains("chat not found"))));
}
