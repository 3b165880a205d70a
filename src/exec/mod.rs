// src/exec/mod.rs

//! Command execution layer.
//!
//! This module is responsible for actually running the commands defined in
//! the jobs, using `tokio::process::Command`, and reporting each result back
//! to the scheduler as a [`crate::engine::JobOutcome`].
//!
//! - [`backend`] provides the `CommandExecutor` trait the scheduler depends
//!   on, which tests can replace with a fake implementation.
//! - [`task_runner`] holds the production `ShellExecutor`.

pub mod backend;
pub mod task_runner;

pub use backend::CommandExecutor;
pub use task_runner::ShellExecutor;
