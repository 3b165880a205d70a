// src/engine/mod.rs

//! Orchestration engine for gflow.
//!
//! This module ties together:
//! - the [`Workflow`] that owns jobs and their ID counter
//! - the [`FailureRegistry`] and [`ExitStatus`] resolver
//! - the durable [`EventLog`]
//! - the run summary written after every run
//!
//! The concurrent scheduler itself lives in [`crate::dag`].

/// Result of executing one job's command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    /// Command failed; the string is the error detail recorded for the job.
    Failed(String),
}

pub mod event_log;
pub mod exit_status;
pub mod failures;
pub mod instantiate;
pub mod summary;
pub mod workflow;

pub use event_log::{EventLog, EventRecord};
pub use exit_status::{ExitStatus, EXIT_FATAL, EXIT_JOBS_FAILED, EXIT_SUCCESS};
pub use failures::{FailureEntry, FailureRegistry};
pub use summary::RunSummary;
pub use workflow::{RunOptions, RunReport, Workflow};
