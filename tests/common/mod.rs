#![allow(dead_code)]

use std::collections::HashMap;

use gflow::config::WorkflowFile;
use gflow::engine::{EventLog, EventRecord, Workflow};
use gflow::types::{JobId, JobState};
use gflow_test_utils::builders::{JobConfigBuilder, WorkflowFileBuilder};
use gflow_test_utils::fake_executor::{ExecRecord, Phase};
use tempfile::TempDir;

/// `B` and `C` both depend on `A`.
pub fn fan_out_config() -> WorkflowFile {
    WorkflowFileBuilder::new()
        .with_job(JobConfigBuilder::new("A", "echo A").build())
        .with_job(JobConfigBuilder::new("B", "echo B").after("A").build())
        .with_job(JobConfigBuilder::new("C", "echo C").after("A").build())
        .build()
}

pub fn workflow_in(dir: &TempDir, def: &WorkflowFile) -> Workflow {
    Workflow::from_definition(def, dir.path()).expect("instantiating workflow")
}

pub fn state_of(workflow: &Workflow, name: &str) -> JobState {
    workflow
        .job_by_name(name)
        .unwrap_or_else(|| panic!("no job named {name}"))
        .state
}

pub async fn events_of(workflow: &Workflow) -> Vec<EventRecord> {
    let run_id = workflow.run_id().expect("workflow has not run");
    EventLog::read_run(&workflow.dirs().event_log_path, run_id)
        .await
        .expect("reading event log")
}

/// Assert that no job in the journal started before all of its dependencies
/// finished.
pub fn assert_dependencies_finished_first(workflow: &Workflow, journal: &[ExecRecord]) {
    let position = |id: JobId, phase: Phase| {
        journal
            .iter()
            .position(|r| r.id == id && r.phase == phase)
    };

    for job in workflow.jobs() {
        let Some(started) = position(job.id, Phase::Started) else {
            continue;
        };
        for dep in &job.dependencies {
            let finished = position(*dep, Phase::Finished)
                .unwrap_or_else(|| panic!("job {} ran but dependency {} never finished", job.id, dep));
            assert!(
                finished < started,
                "job {} started before dependency {} finished",
                job.id,
                dep
            );
        }
    }
}

/// Per-job event kinds, in append order.
pub fn kinds_by_job(events: &[EventRecord]) -> HashMap<JobId, Vec<gflow::types::EventKind>> {
    let mut by_job: HashMap<JobId, Vec<_>> = HashMap::new();
    for e in events {
        by_job.entry(e.job_id).or_default().push(e.kind);
    }
    by_job
}
