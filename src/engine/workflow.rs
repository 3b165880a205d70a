// src/engine/workflow.rs

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::dag::{Job, JobGraph, JobSpec, Scheduler};
use crate::engine::event_log::EventLog;
use crate::engine::exit_status::ExitStatus;
use crate::engine::failures::{FailureEntry, FailureRegistry};
use crate::engine::summary::RunSummary;
use crate::errors::{GflowError, Result};
use crate::exec::CommandExecutor;
use crate::fs::WorkflowDirs;
use crate::types::JobId;

/// Knobs for a single run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Upper bound on concurrently running jobs; `None` means unbounded.
    pub max_parallel: Option<usize>,
    /// Write `.gflow/wf.json` after the run.
    pub write_summary: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_parallel: None,
            write_summary: true,
        }
    }
}

/// What `Workflow::run` hands back to the caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub status: ExitStatus,
    pub failures: Vec<FailureEntry>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        self.status.code()
    }
}

/// All jobs of one invocation plus the run-scoped state around them.
///
/// Built once, run once. After [`Workflow::run`] returns the jobs carry their
/// final states and the workflow should be treated as read-only.
#[derive(Debug)]
pub struct Workflow {
    dirs: WorkflowDirs,
    jobs: Vec<Job>,
    last_id: AtomicU64,
    failures: Arc<FailureRegistry>,
    options: RunOptions,
    run_id: Option<String>,
}

impl Workflow {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            dirs: WorkflowDirs::new(root)?,
            jobs: Vec::new(),
            last_id: AtomicU64::new(0),
            failures: Arc::new(FailureRegistry::new()),
            options: RunOptions::default(),
            run_id: None,
        })
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    pub fn set_options(&mut self, options: RunOptions) {
        self.options = options;
    }

    pub fn dirs(&self) -> &WorkflowDirs {
        &self.dirs
    }

    /// Jobs in registration order (`jobs()[i].id == i + 1`).
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        if id.0 == 0 {
            return None;
        }
        self.jobs.get(id.index())
    }

    pub fn job_by_name(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }

    pub fn failures(&self) -> &FailureRegistry {
        &self.failures
    }

    /// ID of the current run, once [`Workflow::run`] has been called.
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// Register a job whose dependencies are already registered.
    ///
    /// The new job's ID is assigned here, so it is always greater than the IDs
    /// of its dependencies.
    pub fn add_job(&mut self, spec: JobSpec, dependencies: &[JobId]) -> Result<JobId> {
        if self.run_id.is_some() {
            return Err(GflowError::AlreadyRan);
        }

        let registered = self.last_id.load(Ordering::SeqCst);
        for dep in dependencies {
            if dep.0 == 0 || dep.0 > registered {
                return Err(GflowError::UnknownDependency(format!(
                    "job '{}' depends on unregistered job id {}",
                    spec.name, dep
                )));
            }
        }

        let mut deps: Vec<JobId> = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if !deps.contains(dep) {
                deps.push(*dep);
            }
        }

        let id = self.next_job_id();
        let directories = self.dirs.job_directories(id, &spec.name, spec.work_dir.as_deref());
        debug!(job_id = %id, job = %spec.name, deps = ?deps, "job registered");

        self.jobs.push(Job::new(id, spec, directories, deps));
        Ok(id)
    }

    fn next_job_id(&self) -> JobId {
        JobId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Execute every job and resolve the run's exit status.
    ///
    /// Order of operations:
    /// 1. validate the dependency graph (nothing is touched on failure)
    /// 2. provision directories and open the event log
    /// 3. schedule all jobs and wait for every one to finish
    /// 4. resolve the exit status and write the summary
    pub async fn run<E: CommandExecutor>(&mut self, executor: Arc<E>) -> Result<RunReport> {
        if self.run_id.is_some() {
            return Err(GflowError::AlreadyRan);
        }

        let graph = JobGraph::build(&self.jobs)?;

        let run_id = Utc::now().format("%Y%m%dT%H%M%S%.6fZ").to_string();
        self.run_id = Some(run_id.clone());

        info!(
            %run_id,
            workflow_dir = %self.dirs.root.display(),
            jobs = self.jobs.len(),
            "workflow run starting"
        );

        self.dirs.provision()?;
        for job in &self.jobs {
            self.dirs.provision_job(&job.directories)?;
        }

        let event_log = Arc::new(EventLog::open(&self.dirs.event_log_path, run_id.as_str()).await?);

        let scheduler = Scheduler::new(
            graph,
            executor,
            Arc::clone(&event_log),
            Arc::clone(&self.failures),
        )
        .with_max_parallel(self.options.max_parallel);

        self.jobs = match scheduler.run(&self.jobs).await {
            Ok(jobs) => jobs,
            Err(err) => {
                error!(%run_id, error = %err, "workflow run aborted");
                return Err(err);
            }
        };

        let status = ExitStatus::resolve(&self.failures);
        let failures = self.failures.entries();

        if self.options.write_summary {
            self.summary(&run_id, status).write(&self.dirs.summary_path)?;
            debug!(path = %self.dirs.summary_path.display(), "run summary written");
        }

        match status {
            ExitStatus::Success => info!(%run_id, "Workflow success"),
            ExitStatus::JobsFailed => error!(
                %run_id,
                failed = failures.len(),
                exit_code = status.code(),
                "Workflow failed: {} jobs failed",
                failures.len()
            ),
        }

        Ok(RunReport {
            run_id,
            status,
            failures,
        })
    }

    /// Snapshot of the workflow for the summary writer.
    pub fn summary(&self, run_id: &str, status: ExitStatus) -> RunSummary {
        RunSummary {
            workflow_dir: self.dirs.root.clone(),
            run_id: run_id.to_string(),
            status,
            exit_code: status.code(),
            jobs: self.jobs.clone(),
            failures: self.failures.entries(),
        }
    }
}
