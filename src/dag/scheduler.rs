// src/dag/scheduler.rs

use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dag::graph::JobGraph;
use crate::dag::job::Job;
use crate::engine::event_log::EventLog;
use crate::engine::failures::FailureRegistry;
use crate::engine::JobOutcome;
use crate::errors::{GflowError, Result};
use crate::exec::CommandExecutor;
use crate::types::{EventKind, JobId, JobState};

/// Completion signal published by each job task. `None` until terminal.
type Completion = watch::Receiver<Option<JobState>>;

/// Drives a validated [`JobGraph`] to completion.
///
/// It is responsible for:
/// - spawning one task per job
/// - holding each job back until all of its direct dependencies are terminal
/// - running jobs whose dependencies all succeeded
/// - skipping jobs with a failed or skipped dependency
/// - writing lifecycle events and failures as jobs finish
pub struct Scheduler<E: CommandExecutor> {
    graph: JobGraph,
    executor: Arc<E>,
    event_log: Arc<EventLog>,
    failures: Arc<FailureRegistry>,
    limit: Option<Arc<Semaphore>>,
}

impl<E: CommandExecutor> Scheduler<E> {
    pub fn new(
        graph: JobGraph,
        executor: Arc<E>,
        event_log: Arc<EventLog>,
        failures: Arc<FailureRegistry>,
    ) -> Self {
        Self {
            graph,
            executor,
            event_log,
            failures,
            limit: None,
        }
    }

    /// Cap the number of jobs in `Running` at once. `None` (the default)
    /// gives every ready job its own task immediately.
    pub fn with_max_parallel(mut self, max_parallel: Option<usize>) -> Self {
        self.limit = max_parallel
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));
        self
    }

    /// Run every job and return them in their final states, in the same
    /// order as `jobs`.
    ///
    /// Only returns once every job task has joined. An infrastructure error
    /// in any task (event log write, lost signal) aborts all remaining tasks.
    pub async fn run(&self, jobs: &[Job]) -> Result<Vec<Job>> {
        if jobs.len() != self.graph.len() {
            return Err(GflowError::ConfigError(format!(
                "scheduler graph has {} jobs but {} were supplied",
                self.graph.len(),
                jobs.len()
            )));
        }

        let (senders, receivers): (Vec<_>, Vec<_>) =
            jobs.iter().map(|_| watch::channel::<Option<JobState>>(None)).unzip();

        let mut set = JoinSet::new();

        for (job, done) in jobs.iter().zip(senders) {
            let upstream: Vec<(JobId, Completion)> = self
                .graph
                .dependencies_of(job.id)
                .iter()
                .map(|dep| (*dep, receivers[dep.index()].clone()))
                .collect();

            let task = JobTask {
                job: job.clone(),
                upstream,
                done,
                executor: Arc::clone(&self.executor),
                event_log: Arc::clone(&self.event_log),
                failures: Arc::clone(&self.failures),
                limit: self.limit.clone(),
            };

            set.spawn(task.run());
        }

        drop(receivers);
        info!(jobs = jobs.len(), "scheduler: all job tasks spawned");

        let mut finished: Vec<Option<Job>> = vec![None; jobs.len()];

        while let Some(joined) = set.join_next().await {
            let job = match joined {
                Ok(Ok(job)) => job,
                Ok(Err(err)) => {
                    error!(error = %err, "scheduler: job task hit a fatal error; aborting run");
                    set.abort_all();
                    return Err(err);
                }
                Err(join_err) => {
                    error!(error = %join_err, "scheduler: job task panicked; aborting run");
                    set.abort_all();
                    return Err(GflowError::Other(anyhow::anyhow!(
                        "job task did not complete: {join_err}"
                    )));
                }
            };

            let idx = job.id.index();
            finished[idx] = Some(job);
        }

        finished
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| GflowError::Other(anyhow::anyhow!("job task finished without reporting")))
    }
}

/// Everything a single job's task needs, moved into the spawned future.
struct JobTask<E: CommandExecutor> {
    job: Job,
    upstream: Vec<(JobId, Completion)>,
    done: watch::Sender<Option<JobState>>,
    executor: Arc<E>,
    event_log: Arc<EventLog>,
    failures: Arc<FailureRegistry>,
    limit: Option<Arc<Semaphore>>,
}

impl<E: CommandExecutor> JobTask<E> {
    async fn run(mut self) -> Result<Job> {
        let blocked_by = self.await_upstream().await?;

        match blocked_by {
            Some((dep, dep_state)) => self.skip(dep, dep_state).await?,
            None => self.execute().await?,
        }

        // Terminal event is already durable; now release dependents.
        self.done.send_replace(Some(self.job.state));
        Ok(self.job)
    }

    /// Wait for every direct dependency to reach a terminal state.
    ///
    /// Returns the first dependency that did not succeed, if any.
    async fn await_upstream(&mut self) -> Result<Option<(JobId, JobState)>> {
        let mut blocked_by = None;

        for (dep, rx) in self.upstream.iter_mut() {
            let state = rx
                .wait_for(|s| s.is_some_and(JobState::is_terminal))
                .await
                .map_err(|_| {
                    GflowError::Other(anyhow::anyhow!(
                        "completion signal of job {dep} dropped before it finished"
                    ))
                })?
                .unwrap_or(JobState::Failed);

            debug!(job_id = %self.job.id, dep = %dep, ?state, "dependency terminal");

            if state != JobState::Succeeded && blocked_by.is_none() {
                blocked_by = Some((*dep, state));
            }
        }

        Ok(blocked_by)
    }

    async fn skip(&mut self, dep: JobId, dep_state: JobState) -> Result<()> {
        self.job.transition(JobState::Skipped)?;

        let detail = format!("dependency {dep} ended {dep_state:?}");
        warn!(
            job_id = %self.job.id,
            job = %self.job.name,
            %detail,
            "skipping job"
        );

        self.event_log
            .append(self.job.id, EventKind::Skipped, Some(detail))
            .await?;
        Ok(())
    }

    async fn execute(&mut self) -> Result<()> {
        self.job.transition(JobState::Ready)?;

        let _permit = match &self.limit {
            Some(limit) => Some(Arc::clone(limit).acquire_owned().await.map_err(|e| {
                GflowError::Other(anyhow::anyhow!("parallelism limit closed: {e}"))
            })?),
            None => None,
        };

        self.job.transition(JobState::Running)?;
        self.event_log
            .append(self.job.id, EventKind::Started, None)
            .await?;
        info!(job_id = %self.job.id, job = %self.job.name, "job started");

        let outcome = self.executor.execute(&self.job).await;
        match outcome {
            JobOutcome::Success => {
                self.job.transition(JobState::Succeeded)?;
                self.event_log
                    .append(self.job.id, EventKind::Succeeded, None)
                    .await?;
                info!(job_id = %self.job.id, job = %self.job.name, "job succeeded");
            }
            JobOutcome::Failed(detail) => {
                self.job.transition(JobState::Failed)?;
                self.job.error = Some(detail.clone());
                self.failures.record(self.job.id, detail.clone());
                self.event_log
                    .append(self.job.id, EventKind::Failed, Some(detail.clone()))
                    .await?;
                warn!(
                    job_id = %self.job.id,
                    job = %self.job.name,
                    error = %detail,
                    "job failed; dependents will be skipped"
                );
            }
        }

        Ok(())
    }
}
