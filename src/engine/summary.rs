// src/engine/summary.rs

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::dag::Job;
use crate::engine::exit_status::ExitStatus;
use crate::engine::failures::FailureEntry;
use crate::errors::Result;

/// Serializable snapshot of a finished workflow, written to `wf.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub workflow_dir: PathBuf,
    pub run_id: String,
    pub status: ExitStatus,
    pub exit_code: i32,
    pub jobs: Vec<Job>,
    pub failures: Vec<FailureEntry>,
}

impl RunSummary {
    /// Write as pretty-printed JSON, replacing any previous summary.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        std::fs::write(path, json)
            .with_context(|| format!("writing run summary {:?}", path))?;
        Ok(())
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading run summary {:?}", path))?;
        Ok(serde_json::from_str(&contents)?)
    }
}
