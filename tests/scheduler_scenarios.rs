// tests/scheduler_scenarios.rs

mod common;

use std::error::Error;
use std::time::Duration;

use gflow::engine::{ExitStatus, EXIT_JOBS_FAILED};
use gflow::errors::GflowError;
use gflow::types::{EventKind, JobState};
use gflow_test_utils::builders::{JobConfigBuilder, WorkflowFileBuilder};
use gflow_test_utils::fake_executor::FakeExecutor;
use gflow_test_utils::{init_tracing, with_timeout};
use tempfile::TempDir;

use common::{
    assert_dependencies_finished_first, events_of, fan_out_config, state_of, workflow_in,
};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn fan_out_runs_both_dependents_after_success() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let mut workflow = workflow_in(&dir, &fan_out_config());

    let executor = FakeExecutor::new()
        .delay("B", Duration::from_millis(100))
        .delay("C", Duration::from_millis(100))
        .into_arc();

    let report = with_timeout(workflow.run(executor.clone())).await?;

    assert_eq!(report.status, ExitStatus::Success);
    assert_eq!(report.exit_code(), 0);
    assert!(report.failures.is_empty());

    for name in ["A", "B", "C"] {
        assert_eq!(state_of(&workflow, name), JobState::Succeeded, "job {name}");
    }

    let started = executor.started();
    assert_eq!(started.len(), 3);
    assert_eq!(started[0], "A");
    assert_eq!(executor.max_in_flight(), 2, "B and C should overlap");
    assert_dependencies_finished_first(&workflow, &executor.journal());

    Ok(())
}

#[tokio::test]
async fn failed_root_skips_both_dependents() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let mut workflow = workflow_in(&dir, &fan_out_config());

    let executor = FakeExecutor::new().failing("A").into_arc();
    let report = with_timeout(workflow.run(executor.clone())).await?;

    assert_eq!(report.status, ExitStatus::JobsFailed);
    assert_eq!(report.exit_code(), EXIT_JOBS_FAILED);

    let a = workflow.job_by_name("A").unwrap().id;
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].job_id, a);
    assert_eq!(workflow.failures().count(), 1);

    assert_eq!(state_of(&workflow, "A"), JobState::Failed);
    assert_eq!(state_of(&workflow, "B"), JobState::Skipped);
    assert_eq!(state_of(&workflow, "C"), JobState::Skipped);
    assert_eq!(executor.started(), vec!["A".to_string()]);

    let failed = workflow.job_by_name("A").unwrap();
    assert_eq!(failed.error.as_deref(), Some("A failed on purpose"));

    Ok(())
}

#[tokio::test]
async fn skip_propagates_transitively() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let def = WorkflowFileBuilder::new()
        .with_job(JobConfigBuilder::new("A", "a").build())
        .with_job(JobConfigBuilder::new("B", "b").after("A").build())
        .with_job(JobConfigBuilder::new("C", "c").after("B").build())
        .with_job(JobConfigBuilder::new("D", "d").after("C").build())
        .build();
    let mut workflow = workflow_in(&dir, &def);

    let executor = FakeExecutor::new().failing("A").into_arc();
    let report = with_timeout(workflow.run(executor.clone())).await?;

    assert_eq!(report.failures.len(), 1);
    for name in ["B", "C", "D"] {
        assert_eq!(state_of(&workflow, name), JobState::Skipped, "job {name}");
    }

    let events = events_of(&workflow).await;
    for name in ["B", "C", "D"] {
        let id = workflow.job_by_name(name).unwrap().id;
        let kinds: Vec<_> = events.iter().filter(|e| e.job_id == id).map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::Skipped], "job {name}");
    }

    Ok(())
}

#[tokio::test]
async fn job_with_one_failed_dependency_is_skipped_entirely() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let def = WorkflowFileBuilder::new()
        .with_job(JobConfigBuilder::new("ok", "true").build())
        .with_job(JobConfigBuilder::new("bad", "false").build())
        .with_job(JobConfigBuilder::new("join", "echo").after("ok").after("bad").build())
        .build();
    let mut workflow = workflow_in(&dir, &def);

    let executor = FakeExecutor::new().failing("bad").into_arc();
    let report = with_timeout(workflow.run(executor.clone())).await?;

    assert_eq!(state_of(&workflow, "ok"), JobState::Succeeded);
    assert_eq!(state_of(&workflow, "bad"), JobState::Failed);
    assert_eq!(state_of(&workflow, "join"), JobState::Skipped);
    assert_eq!(report.failures.len(), 1);
    assert!(!executor.started().contains(&"join".to_string()));

    Ok(())
}

#[tokio::test]
async fn failure_does_not_stop_independent_branches() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let def = WorkflowFileBuilder::new()
        .with_job(JobConfigBuilder::new("fast_fail", "false").build())
        .with_job(JobConfigBuilder::new("slow", "sleep 1").build())
        .with_job(JobConfigBuilder::new("after_slow", "true").after("slow").build())
        .build();
    let mut workflow = workflow_in(&dir, &def);

    let executor = FakeExecutor::new()
        .failing("fast_fail")
        .delay("slow", Duration::from_millis(150))
        .into_arc();
    let report = with_timeout(workflow.run(executor)).await?;

    assert_eq!(report.status, ExitStatus::JobsFailed);
    assert_eq!(state_of(&workflow, "slow"), JobState::Succeeded);
    assert_eq!(state_of(&workflow, "after_slow"), JobState::Succeeded);

    Ok(())
}

#[tokio::test]
async fn diamond_never_starts_a_job_before_its_dependencies_finish() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let def = WorkflowFileBuilder::new()
        .with_job(JobConfigBuilder::new("top", "t").build())
        .with_job(JobConfigBuilder::new("left", "l").after("top").build())
        .with_job(JobConfigBuilder::new("right", "r").after("top").build())
        .with_job(
            JobConfigBuilder::new("bottom", "b")
                .after("left")
                .after("right")
                .build(),
        )
        .build();
    let mut workflow = workflow_in(&dir, &def);

    let executor = FakeExecutor::new()
        .delay("left", Duration::from_millis(20))
        .delay("right", Duration::from_millis(80))
        .into_arc();
    with_timeout(workflow.run(executor.clone())).await?;

    let started = executor.started();
    assert_eq!(started.first().map(String::as_str), Some("top"));
    assert_eq!(started.last().map(String::as_str), Some("bottom"));
    assert_dependencies_finished_first(&workflow, &executor.journal());

    Ok(())
}

#[tokio::test]
async fn max_parallel_bounds_running_jobs() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let mut builder = WorkflowFileBuilder::new().max_parallel(1);
    let mut executor = FakeExecutor::new();
    for i in 0..4 {
        let name = format!("job{i}");
        builder = builder.with_job(JobConfigBuilder::new(&name, "true").build());
        executor = executor.delay(&name, Duration::from_millis(20));
    }
    let mut workflow = workflow_in(&dir, &builder.build());
    let executor = executor.into_arc();

    let report = with_timeout(workflow.run(executor.clone())).await?;

    assert!(report.status.is_success());
    assert_eq!(executor.started().len(), 4);
    assert_eq!(executor.max_in_flight(), 1);

    Ok(())
}

#[tokio::test]
async fn workflow_runs_only_once() -> TestResult {
    init_tracing();
    let dir = TempDir::new()?;
    let mut workflow = workflow_in(&dir, &fan_out_config());
    let executor = FakeExecutor::new().into_arc();

    with_timeout(workflow.run(executor.clone())).await?;
    let second = workflow.run(executor.clone()).await;

    assert!(matches!(second, Err(GflowError::AlreadyRan)));
    assert_eq!(executor.started().len(), 3);

    Ok(())
}
