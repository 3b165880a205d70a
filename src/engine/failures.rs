// src/engine/failures.rs

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::types::JobId;

/// One failed job and the reason it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub job_id: JobId,
    pub detail: String,
}

/// Concurrency-safe record of which jobs failed during a run.
///
/// Insert-only: once a job is recorded its detail never changes and entries
/// are never removed. Skipped jobs are not recorded here.
#[derive(Debug, Default)]
pub struct FailureRegistry {
    jobs: Mutex<BTreeMap<JobId, String>>,
}

impl FailureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure. A second record for the same job keeps the first
    /// detail and returns `false`.
    pub fn record(&self, job_id: JobId, detail: impl Into<String>) -> bool {
        let mut jobs = self.lock();
        if jobs.contains_key(&job_id) {
            return false;
        }
        jobs.insert(job_id, detail.into());
        true
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, job_id: JobId) -> bool {
        self.lock().contains_key(&job_id)
    }

    /// Snapshot of all failures, ordered by job ID.
    pub fn entries(&self) -> Vec<FailureEntry> {
        self.lock()
            .iter()
            .map(|(job_id, detail)| FailureEntry {
                job_id: *job_id,
                detail: detail.clone(),
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<JobId, String>> {
        // Entries are written whole under the lock, so a poisoned map is
        // still consistent.
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
