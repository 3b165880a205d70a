// src/engine/event_log.rs

//! Durable, append-only job lifecycle log.
//!
//! Records are stored as JSON lines. Every append is written and `fsync`ed
//! before it returns, so an acknowledged record survives a crash. Appends
//! from concurrent jobs are serialized behind one async mutex; a job's own
//! records keep their order because its task awaits each append.
//!
//! The file may hold records from several runs; each record carries the
//! `run_id` it belongs to.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::{GflowError, Result};
use crate::types::{EventKind, JobId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub run_id: String,
    pub job_id: JobId,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    run_id: String,
    file: Mutex<File>,
}

impl EventLog {
    /// Open (or create) the log at `path` for appending records of `run_id`.
    pub async fn open(path: impl AsRef<Path>, run_id: impl Into<String>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let created = !tokio::fs::try_exists(&path).await.unwrap_or(false);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| GflowError::EventLog(format!("opening {}: {e}", path.display())))?;

        // A new file's directory entry must be durable too, or synced records
        // can vanish with it after a crash.
        if created {
            sync_parent_dir(&path).await?;
        }

        let run_id = run_id.into();
        debug!(path = %path.display(), %run_id, "event log opened");

        Ok(Self {
            path,
            run_id,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Append one record and wait until it is durable.
    pub async fn append(
        &self,
        job_id: JobId,
        kind: EventKind,
        detail: Option<String>,
    ) -> Result<EventRecord> {
        let record = EventRecord {
            run_id: self.run_id.clone(),
            job_id,
            kind,
            timestamp: Utc::now(),
            detail,
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .map_err(|e| self.write_error(e))?;
        file.sync_data().await.map_err(|e| self.write_error(e))?;

        debug!(job_id = %job_id, ?kind, "event appended");
        Ok(record)
    }

    fn write_error(&self, err: std::io::Error) -> GflowError {
        GflowError::EventLog(format!("appending to {}: {err}", self.path.display()))
    }

    /// Read every record in the log, across all runs.
    ///
    /// A torn final line (crash during an append that was never
    /// acknowledged) is dropped; corruption anywhere else is an error.
    pub async fn read_all(path: impl AsRef<Path>) -> Result<Vec<EventRecord>> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GflowError::EventLog(format!("reading {}: {e}", path.display())))?;

        let lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut records = Vec::with_capacity(lines.len());

        for (idx, line) in lines.iter().enumerate() {
            match serde_json::from_str::<EventRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if idx + 1 == lines.len() && !contents.ends_with('\n') => {
                    warn!(path = %path.display(), error = %e, "ignoring torn trailing record");
                }
                Err(e) => {
                    return Err(GflowError::EventLog(format!(
                        "corrupt record at line {} of {}: {e}",
                        idx + 1,
                        path.display()
                    )));
                }
            }
        }

        Ok(records)
    }

    /// Records belonging to one run, in append order.
    pub async fn read_run(path: impl AsRef<Path>, run_id: &str) -> Result<Vec<EventRecord>> {
        let records = Self::read_all(path).await?;
        Ok(records.into_iter().filter(|r| r.run_id == run_id).collect())
    }
}

#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let dir = File::open(parent)
        .await
        .map_err(|e| GflowError::EventLog(format!("opening {}: {e}", parent.display())))?;
    dir.sync_all()
        .await
        .map_err(|e| GflowError::EventLog(format!("syncing {}: {e}", parent.display())))
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}
