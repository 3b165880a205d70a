// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`job`] holds the job type and its lifecycle state machine.
//! - [`graph`] holds the arena DAG over job IDs and its validation.
//! - [`scheduler`] runs every job concurrently, gated on its dependencies.

pub mod graph;
pub mod job;
pub mod scheduler;

pub use graph::JobGraph;
pub use job::{Job, JobDirectories, JobSpec};
pub use scheduler::Scheduler;
