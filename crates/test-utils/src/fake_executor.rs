use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gflow::dag::Job;
use gflow::engine::JobOutcome;
use gflow::exec::CommandExecutor;
use gflow::types::JobId;

/// Whether a journal entry marks the start or the end of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Started,
    Finished,
}

/// One entry in the fake executor's journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRecord {
    pub id: JobId,
    pub name: String,
    pub phase: Phase,
}

/// A fake executor that:
/// - records when each job started and finished, in order
/// - fails jobs whose names were registered with [`FakeExecutor::failing`]
/// - optionally sleeps per job to force overlap between concurrent jobs
#[derive(Default)]
pub struct FakeExecutor {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    journal: Mutex<Vec<ExecRecord>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the job called `name` fail.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Make the job called `name` take `delay` to run.
    pub fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn journal(&self) -> Vec<ExecRecord> {
        self.journal.lock().unwrap().clone()
    }

    /// Names of jobs that were executed, in start order.
    pub fn started(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|r| r.phase == Phase::Started)
            .map(|r| r.name)
            .collect()
    }

    /// Highest number of jobs observed executing at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn push(&self, job: &Job, phase: Phase) {
        self.journal.lock().unwrap().push(ExecRecord {
            id: job.id,
            name: job.name.clone(),
            phase,
        });
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        job: &'a Job,
    ) -> Pin<Box<dyn Future<Output = JobOutcome> + Send + 'a>> {
        Box::pin(async move {
            self.push(job, Phase::Started);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            match self.delays.get(&job.name) {
                Some(delay) => tokio::time::sleep(*delay).await,
                None => tokio::task::yield_now().await,
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.push(job, Phase::Finished);

            if self.failing.contains(&job.name) {
                JobOutcome::Failed(format!("{} failed on purpose", job.name))
            } else {
                JobOutcome::Success
            }
        })
    }
}
