use std::collections::{BTreeSet, HashSet};

use gflow::dag::JobSpec;
use gflow::engine::{EventLog, RunOptions, Workflow};
use gflow::types::{EventKind, JobId, JobState};
use gflow_test_utils::fake_executor::{FakeExecutor, Phase};
use proptest::prelude::*;
use tempfile::TempDir;

// Strategy to generate a valid DAG as dependency lists.
// We ensure acyclicity by only allowing job N to depend on jobs 0..N-1.
fn dag_strategy(max_jobs: usize) -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    (1..=max_jobs).prop_flat_map(|num_jobs| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_jobs),
            num_jobs,
        )
        .prop_map(|raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    // Sanitize dependencies: only allow deps < i
                    potential
                        .into_iter()
                        .filter(|_| i > 0)
                        .map(|d| d % i.max(1))
                        .collect::<BTreeSet<usize>>()
                })
                .collect::<Vec<_>>()
        })
    })
}

/// States the propagation policy predicts, in ID order.
fn expected_states(deps: &[BTreeSet<usize>], failing: &HashSet<usize>) -> Vec<JobState> {
    let mut states: Vec<JobState> = Vec::with_capacity(deps.len());
    for (i, job_deps) in deps.iter().enumerate() {
        let state = if job_deps.iter().any(|d| states[*d] != JobState::Succeeded) {
            JobState::Skipped
        } else if failing.contains(&i) {
            JobState::Failed
        } else {
            JobState::Succeeded
        };
        states.push(state);
    }
    states
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_scheduler_honours_dependencies_and_propagation(
        deps in dag_strategy(10),
        failing_indices in proptest::collection::vec(0..10usize, 0..4),
    ) {
        let dir = TempDir::new().unwrap();
        let mut workflow = Workflow::new(dir.path()).unwrap().with_options(RunOptions {
            max_parallel: None,
            write_summary: false,
        });

        let mut ids: Vec<JobId> = Vec::new();
        for (i, job_deps) in deps.iter().enumerate() {
            let dep_ids: Vec<JobId> = job_deps.iter().map(|d| ids[*d]).collect();
            let id = workflow
                .add_job(JobSpec::new(format!("job_{i}"), "true"), &dep_ids)
                .unwrap();
            ids.push(id);
        }

        let failing: HashSet<usize> = failing_indices
            .into_iter()
            .filter(|i| *i < deps.len())
            .collect();
        let mut executor = FakeExecutor::new();
        for i in &failing {
            executor = executor.failing(&format!("job_{i}"));
        }
        let executor = executor.into_arc();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let report = runtime.block_on(workflow.run(executor.clone())).unwrap();
        prop_assert!(!workflow.dirs().summary_path.exists());

        // Final states match the propagation policy.
        let expected = expected_states(&deps, &failing);
        let actual: Vec<JobState> = workflow.jobs().iter().map(|j| j.state).collect();
        prop_assert_eq!(&actual, &expected);

        // Exit status is nonzero iff the registry is non-empty.
        let any_failed = expected.contains(&JobState::Failed);
        prop_assert_eq!(report.exit_code() != 0, any_failed);
        prop_assert_eq!(workflow.failures().is_empty(), !any_failed);
        prop_assert_eq!(
            workflow.failures().count(),
            expected.iter().filter(|s| **s == JobState::Failed).count()
        );

        // Skipped jobs never reached the executor; a job only started after
        // all of its dependencies finished.
        let journal = executor.journal();
        for job in workflow.jobs() {
            let started = journal
                .iter()
                .position(|r| r.id == job.id && r.phase == Phase::Started);
            if job.state == JobState::Skipped {
                prop_assert!(started.is_none(), "skipped job {} was started", job.id);
                continue;
            }
            let started = started.unwrap();
            for dep in &job.dependencies {
                let finished = journal
                    .iter()
                    .position(|r| r.id == *dep && r.phase == Phase::Finished);
                prop_assert!(finished.is_some_and(|f| f < started));
            }
        }

        // Started precedes the terminal event for every job in the log.
        let events = runtime
            .block_on(EventLog::read_run(&workflow.dirs().event_log_path, &report.run_id))
            .unwrap();
        for job in workflow.jobs() {
            let kinds: Vec<EventKind> = events
                .iter()
                .filter(|e| e.job_id == job.id)
                .map(|e| e.kind)
                .collect();
            match job.state {
                JobState::Skipped => {
                    prop_assert_eq!(kinds, vec![EventKind::Skipped]);
                }
                JobState::Failed => {
                    prop_assert_eq!(kinds, vec![EventKind::Started, EventKind::Failed]);
                }
                _ => {
                    prop_assert_eq!(kinds, vec![EventKind::Started, EventKind::Succeeded]);
                }
            }
        }
    }
}
