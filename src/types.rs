use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique, positive job identifier assigned at registration time.
///
/// IDs start at 1 and follow registration order, so a job's dependencies
/// always carry smaller IDs than the job itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Position of this job in the workflow's arena.
    ///
    /// # Panics
    ///
    /// Panics on `JobId(0)`, which is never assigned. Check ids that did not
    /// come from a `Workflow` before indexing with them.
    pub fn index(self) -> usize {
        assert!(self.0 > 0, "JobId(0) has no arena slot");
        (self.0 - 1) as usize
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a job.
///
/// `Succeeded`, `Failed` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Pending
    }
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Skipped
        )
    }
}

/// Kind of record stored in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Started,
    Succeeded,
    Failed,
    Skipped,
}

impl EventKind {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EventKind::Started)
    }
}
