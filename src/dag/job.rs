// src/dag/job.rs

//! Job definition and lifecycle state machine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{GflowError, Result};
use crate::types::{JobId, JobState};

/// Per-job directories, provisioned by [`crate::fs::WorkflowDirs`] before the
/// run starts. The scheduler only reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDirectories {
    /// Directory the command runs in.
    pub work_dir: PathBuf,
    /// File receiving the command's stdout/stderr.
    pub log_file: PathBuf,
    /// Scratch space, removed after completion when `clean_tmp` is set.
    pub tmp_dir: PathBuf,
}

/// What a caller hands to [`crate::engine::Workflow::add_job`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub cmd: String,
    /// Working directory relative to the workflow root (root itself if `None`).
    pub work_dir: Option<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub clean_tmp: bool,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            ..Default::default()
        }
    }
}

/// A registered unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub directories: JobDirectories,
    /// Direct dependencies, as IDs into the workflow's arena.
    pub dependencies: Vec<JobId>,
    pub outputs: Vec<PathBuf>,
    pub clean_tmp: bool,
    pub cmd: String,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    pub fn new(id: JobId, spec: JobSpec, directories: JobDirectories, dependencies: Vec<JobId>) -> Self {
        Self {
            id,
            name: spec.name,
            directories,
            dependencies,
            outputs: spec.outputs,
            clean_tmp: spec.clean_tmp,
            cmd: spec.cmd,
            state: JobState::Pending,
            error: None,
        }
    }

    /// Move the job to `next`, rejecting anything the lifecycle does not allow.
    pub fn transition(&mut self, next: JobState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(GflowError::InvalidTransition {
                job_id: self.id,
                from: self.state,
                to: next,
            });
        }

        debug!(
            job_id = %self.id,
            job = %self.name,
            from = ?self.state,
            to = ?next,
            "job state transition"
        );
        self.state = next;
        Ok(())
    }
}

impl JobState {
    /// Allowed edges:
    ///
    /// ```text
    /// Pending -> Ready -> Running -> Succeeded | Failed
    /// Pending | Ready -> Skipped
    /// ```
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;

        matches!(
            (self, next),
            (Pending, Ready)
                | (Ready, Running)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Pending, Skipped)
                | (Ready, Skipped)
        )
    }
}
