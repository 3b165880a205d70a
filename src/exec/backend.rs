// src/exec/backend.rs

//! Pluggable command-execution abstraction.
//!
//! The scheduler talks to a `CommandExecutor` instead of spawning processes
//! itself. This makes it easy to swap in a fake executor in tests while
//! keeping the production implementation in [`super::task_runner`].
//!
//! - `ShellExecutor` is the default implementation used by `gflow`. It runs
//!   the job's command through the platform shell.
//! - Tests can provide their own `CommandExecutor` that, for example, records
//!   which jobs ran and returns scripted outcomes.

use std::future::Future;
use std::pin::Pin;

use crate::dag::Job;
use crate::engine::JobOutcome;

/// Trait abstracting how a single job's command is run.
///
/// Implementations must not panic on command failure: every failure mode is
/// reported as [`JobOutcome::Failed`] with a human-readable detail.
pub trait CommandExecutor: Send + Sync + 'static {
    /// Run `job`'s command to completion in its working directory.
    fn execute<'a>(
        &'a self,
        job: &'a Job,
    ) -> Pin<Box<dyn Future<Output = JobOutcome> + Send + 'a>>;
}
