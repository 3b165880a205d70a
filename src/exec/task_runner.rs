// src/exec/task_runner.rs

//! Shell-backed job runner.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::dag::Job;
use crate::engine::JobOutcome;
use crate::exec::CommandExecutor;

/// Runs each job as `sh -c <cmd>` (`cmd /C` on Windows).
///
/// - The process runs in the job's working directory with `GFLOW_JOB_ID`,
///   `GFLOW_JOB_NAME` and `GFLOW_TMP_DIR` set.
/// - The scratch directory is created just before the process starts, so
///   jobs that never run leave nothing under `.gflow/tmp`.
/// - stdout and stderr are copied byte for byte into the job's log file.
/// - When `clean_tmp` is set the scratch directory is removed afterwards,
///   whatever the outcome.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute<'a>(
        &'a self,
        job: &'a Job,
    ) -> Pin<Box<dyn Future<Output = JobOutcome> + Send + 'a>> {
        Box::pin(async move {
            let outcome = match run_job(job).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(
                        job_id = %job.id,
                        job = %job.name,
                        error = %format!("{err:#}"),
                        "job execution error"
                    );
                    JobOutcome::Failed(format!("{err:#}"))
                }
            };

            if job.clean_tmp {
                if let Err(err) = crate::fs::clean_dir(&job.directories.tmp_dir) {
                    warn!(job_id = %job.id, error = %err, "failed to clean tmp dir");
                }
            }

            outcome
        })
    }
}

async fn run_job(job: &Job) -> Result<JobOutcome> {
    info!(
        job_id = %job.id,
        job = %job.name,
        cmd = %job.cmd,
        work_dir = %job.directories.work_dir.display(),
        "starting job process"
    );

    tokio::fs::create_dir_all(&job.directories.tmp_dir)
        .await
        .with_context(|| format!("creating tmp dir {:?}", job.directories.tmp_dir))?;

    let log_file = File::create(&job.directories.log_file)
        .await
        .with_context(|| format!("creating log file {:?}", job.directories.log_file))?;
    let log_file = Arc::new(Mutex::new(log_file));

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&job.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&job.cmd);
        c
    };

    cmd.current_dir(&job.directories.work_dir)
        .env("GFLOW_JOB_ID", job.id.to_string())
        .env("GFLOW_JOB_NAME", &job.name)
        .env("GFLOW_TMP_DIR", &job.directories.tmp_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for job '{}'", job.name))?;

    let stdout = child.stdout.take().map(|out| {
        tokio::spawn(copy_lines(out, Arc::clone(&log_file), job.name.clone(), "stdout"))
    });
    let stderr = child.stderr.take().map(|err| {
        tokio::spawn(copy_lines(err, Arc::clone(&log_file), job.name.clone(), "stderr"))
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of job '{}'", job.name))?;

    // Drain both streams before reporting so the log file is complete.
    for handle in [stdout, stderr].into_iter().flatten() {
        handle
            .await
            .context("joining output reader")?
            .context("copying job output to log file")?;
    }
    log_file.lock().await.flush().await?;

    let code = status.code().unwrap_or(-1);
    info!(
        job_id = %job.id,
        job = %job.name,
        exit_code = code,
        success = status.success(),
        "job process exited"
    );

    if status.success() {
        Ok(JobOutcome::Success)
    } else {
        Ok(JobOutcome::Failed(format!("exit code {code}")))
    }
}

/// Copy `stream` to the shared log file a line at a time, echoing at debug.
///
/// Bytes go to the log untouched; only the debug echo is decoded (lossily).
async fn copy_lines<R>(
    stream: R,
    log_file: Arc<Mutex<File>>,
    job_name: String,
    source: &'static str,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        debug!(
            job = %job_name,
            "{source}: {}",
            String::from_utf8_lossy(&buf).trim_end()
        );
        log_file.lock().await.write_all(&buf).await?;
    }

    Ok(())
}
