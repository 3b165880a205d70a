// src/fs/mod.rs

//! On-disk layout of a workflow run.
//!
//! ```text
//! <root>/
//!   .gflow/
//!     log/<id>-<name>.log   per-job command output
//!     tmp/<id>-<name>/      per-job scratch space
//!     event.db              durable event log (JSON lines)
//!     wf.json               run summary
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::dag::JobDirectories;
use crate::errors::Result;
use crate::types::JobId;

/// Name of the state directory created under the workflow root.
pub const STATE_DIR: &str = ".gflow";

/// Absolute paths for one workflow root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDirs {
    pub root: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
    pub tmp_dir: PathBuf,
    pub event_log_path: PathBuf,
    pub summary_path: PathBuf,
}

impl WorkflowDirs {
    /// Compute the layout for `root`. Nothing is created until
    /// [`WorkflowDirs::provision`].
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = std::path::absolute(root.as_ref())
            .with_context(|| format!("resolving workflow dir {:?}", root.as_ref()))?;
        let state_dir = root.join(STATE_DIR);

        Ok(Self {
            log_dir: state_dir.join("log"),
            tmp_dir: state_dir.join("tmp"),
            event_log_path: state_dir.join("event.db"),
            summary_path: state_dir.join("wf.json"),
            state_dir,
            root,
        })
    }

    /// Create the root, log and tmp directories.
    pub fn provision(&self) -> Result<()> {
        for dir in [&self.root, &self.log_dir, &self.tmp_dir] {
            fs::create_dir_all(dir).with_context(|| format!("creating dir {:?}", dir))?;
        }
        debug!(root = %self.root.display(), "workflow directories provisioned");
        Ok(())
    }

    /// Paths for one job. `work_dir` is taken relative to the root.
    pub fn job_directories(&self, id: JobId, name: &str, work_dir: Option<&Path>) -> JobDirectories {
        let slug = format!("{}-{}", id, sanitize(name));
        JobDirectories {
            work_dir: work_dir
                .map(|d| self.root.join(d))
                .unwrap_or_else(|| self.root.clone()),
            log_file: self.log_dir.join(format!("{slug}.log")),
            tmp_dir: self.tmp_dir.join(slug),
        }
    }

    /// Create the job's working directory. The scratch directory is left to
    /// the executor, which creates it only for jobs that actually run.
    pub fn provision_job(&self, dirs: &JobDirectories) -> Result<()> {
        fs::create_dir_all(&dirs.work_dir)
            .with_context(|| format!("creating dir {:?}", dirs.work_dir))?;
        Ok(())
    }
}

/// Remove a scratch directory and everything in it. Missing is fine.
pub fn clean_dir(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("removing dir {:?}", path))
            .into()),
    }
}

/// Keep job names usable as file names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
