// tests/job_lifecycle.rs

use std::sync::Arc;

use gflow::cli::LogLevel;
use gflow::dag::{Job, JobDirectories, JobSpec};
use gflow::engine::{ExitStatus, FailureRegistry, EXIT_JOBS_FAILED, EXIT_SUCCESS};
use gflow::errors::GflowError;
use gflow::logging::resolve_level;
use gflow::types::{JobId, JobState};

fn pending_job() -> Job {
    Job::new(
        JobId(1),
        JobSpec::new("a", "true"),
        JobDirectories::default(),
        vec![],
    )
}

#[test]
fn happy_path_transitions() {
    let mut job = pending_job();
    assert_eq!(job.state, JobState::Pending);

    job.transition(JobState::Ready).unwrap();
    job.transition(JobState::Running).unwrap();
    job.transition(JobState::Succeeded).unwrap();

    assert!(job.state.is_terminal());
}

#[test]
fn skip_is_allowed_from_pending_and_ready_only() {
    let mut job = pending_job();
    job.transition(JobState::Skipped).unwrap();

    let mut job = pending_job();
    job.transition(JobState::Ready).unwrap();
    job.transition(JobState::Skipped).unwrap();

    let mut job = pending_job();
    job.transition(JobState::Ready).unwrap();
    job.transition(JobState::Running).unwrap();
    let err = job.transition(JobState::Skipped).unwrap_err();
    assert!(matches!(
        err,
        GflowError::InvalidTransition {
            from: JobState::Running,
            to: JobState::Skipped,
            ..
        }
    ));
    assert_eq!(job.state, JobState::Running);
}

#[test]
fn terminal_states_are_final() {
    use JobState::*;

    for terminal in [Succeeded, Failed, Skipped] {
        for next in [Pending, Ready, Running, Succeeded, Failed, Skipped] {
            assert!(
                !terminal.can_transition_to(next),
                "{terminal:?} -> {next:?} should be rejected"
            );
        }
    }
}

#[test]
fn cannot_run_without_becoming_ready() {
    let mut job = pending_job();
    assert!(job.transition(JobState::Running).is_err());
    assert!(job.transition(JobState::Failed).is_err());
    assert_eq!(job.state, JobState::Pending);
}

#[test]
fn exit_status_follows_the_failure_registry() {
    let registry = FailureRegistry::new();
    assert_eq!(ExitStatus::resolve(&registry), ExitStatus::Success);
    assert_eq!(ExitStatus::resolve(&registry).code(), EXIT_SUCCESS);

    registry.record(JobId(3), "exit code 1");
    assert_eq!(ExitStatus::resolve(&registry), ExitStatus::JobsFailed);
    assert_eq!(ExitStatus::resolve(&registry).code(), EXIT_JOBS_FAILED);
    assert_ne!(EXIT_JOBS_FAILED, 0);
}

#[test]
fn registry_keeps_the_first_detail() {
    let registry = FailureRegistry::new();
    assert!(registry.record(JobId(1), "first"));
    assert!(!registry.record(JobId(1), "second"));

    let entries = registry.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].detail, "first");
    assert!(registry.contains(JobId(1)));
    assert!(!registry.contains(JobId(2)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registry_accepts_concurrent_writers() {
    let registry = Arc::new(FailureRegistry::new());

    let handles: Vec<_> = (1..=64u64)
        .map(|id| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry.record(JobId(id), format!("job {id} failed"));
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(registry.count(), 64);
    let ids: Vec<u64> = registry.entries().iter().map(|e| e.job_id.0).collect();
    assert_eq!(ids, (1..=64).collect::<Vec<_>>());
}

#[test]
fn log_level_prefers_flag_then_env() {
    assert_eq!(
        resolve_level(Some(LogLevel::Debug), Some("error")),
        tracing::Level::DEBUG
    );
    assert_eq!(resolve_level(None, Some(" Warning ")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("nonsense")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}

#[test]
fn job_ids_map_to_arena_slots() {
    assert_eq!(JobId(1).index(), 0);
    assert_eq!(JobId(7).index(), 6);
}

#[test]
#[should_panic(expected = "JobId(0)")]
fn zero_job_id_has_no_arena_slot() {
    let _ = JobId(0).index();
}
