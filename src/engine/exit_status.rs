// src/engine/exit_status.rs

use serde::{Deserialize, Serialize};

use crate::engine::failures::FailureRegistry;

/// Process exit code when every job succeeded.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code when at least one job failed.
pub const EXIT_JOBS_FAILED: i32 = 1;
/// Process exit code for fatal startup/infrastructure errors, where no
/// meaningful job outcome exists.
pub const EXIT_FATAL: i32 = 2;

/// Overall outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Success,
    JobsFailed,
}

impl ExitStatus {
    /// Derive the run outcome from the final failure registry.
    ///
    /// Skipped jobs do not count: they only ever follow a recorded failure.
    pub fn resolve(failures: &FailureRegistry) -> Self {
        if failures.is_empty() {
            ExitStatus::Success
        } else {
            ExitStatus::JobsFailed
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => EXIT_SUCCESS,
            ExitStatus::JobsFailed => EXIT_JOBS_FAILED,
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }
}
