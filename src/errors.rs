// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::{JobId, JobState};

#[derive(Error, Debug)]
pub enum GflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown dependency: {0}")]
    UnknownDependency(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Invalid transition for job {job_id}: {from:?} -> {to:?}")]
    InvalidTransition {
        job_id: JobId,
        from: JobState,
        to: JobState,
    },

    #[error("Workflow has already been run")]
    AlreadyRan,

    #[error("Event log error: {0}")]
    EventLog(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GflowError {
    /// Whether the error was raised before any job could start, i.e. the
    /// workflow definition itself is malformed.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GflowError::ConfigError(_) | GflowError::UnknownDependency(_) | GflowError::DagCycle(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GflowError>;
