// src/config/mod.rs

//! Workflow definition loading and validation for gflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition file from disk (`loader.rs`).
//! - Validate dependency references and DAG correctness (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_workflow_path, load_and_validate, load_from_path, parse_str};
pub use model::{DependencyConfig, JobConfig, RawWorkflowFile, WorkflowFile, WorkflowSection};
pub use validate::validate_workflow;
