// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::WorkflowFile;
use crate::dag::JobGraph;
use crate::engine::{RunOptions, Workflow};
use crate::errors::Result;
use crate::exec::ShellExecutor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - definition loading and validation
/// - job instantiation into a [`Workflow`]
/// - the shell executor
///
/// Returns the process exit code of the run (0 or
/// [`engine::EXIT_JOBS_FAILED`]). Configuration and infrastructure errors are
/// returned as `Err` before or instead of a code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let def = load_and_validate(&args.workflow)?;
    let root = workflow_root(&args.workflow, args.workflow_dir.as_deref(), &def);

    let mut workflow = Workflow::from_definition(&def, &root)?;

    let mut options = workflow.options();
    if let Some(n) = args.max_parallel {
        options.max_parallel = Some(n as usize);
    }
    options.write_summary = !args.no_summary;
    workflow.set_options(options);

    if args.dry_run {
        print_dry_run(&workflow, options)?;
        return Ok(engine::EXIT_SUCCESS);
    }

    info!(
        workflow = %args.workflow.display(),
        root = %root.display(),
        jobs = workflow.jobs().len(),
        "loaded workflow"
    );

    let report = workflow.run(Arc::new(ShellExecutor::new())).await?;
    Ok(report.exit_code())
}

/// Figure out the workflow root.
///
/// - `--workflow-dir` wins if given.
/// - Otherwise `[workflow].dir`, relative to the definition file's directory.
/// - A bare file name like "Gflow.toml" (parent = "") resolves against the
///   current working directory.
fn workflow_root(def_path: &Path, override_dir: Option<&Path>, def: &WorkflowFile) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }

    let base = match def_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    base.join(&def.workflow.dir)
}

/// Simple dry-run output: print jobs, IDs, deps and commands.
fn print_dry_run(workflow: &Workflow, options: RunOptions) -> Result<()> {
    let graph = JobGraph::build(workflow.jobs())?;

    println!("gflow dry-run");
    println!("  workflow.dir = {}", workflow.dirs().root.display());
    match options.max_parallel {
        Some(n) => println!("  workflow.max_parallel = {n}"),
        None => println!("  workflow.max_parallel = unbounded"),
    }
    println!();

    println!("  roots = {:?}", names_of(workflow, &graph.roots()));
    println!();

    println!("jobs ({}):", workflow.jobs().len());
    for job in workflow.jobs() {
        println!("  - [{}] {}", job.id, job.name);
        println!("      cmd: {}", job.cmd);
        if !job.dependencies.is_empty() {
            println!("      after: {:?}", names_of(workflow, &job.dependencies));
        }
        let dependents = graph.dependents_of(job.id);
        if !dependents.is_empty() {
            println!("      needed by: {:?}", names_of(workflow, dependents));
        }
        let downstream = graph.transitive_dependents(job.id);
        if downstream.len() > dependents.len() {
            println!("      skips on failure: {:?}", names_of(workflow, &downstream));
        }
        if !job.outputs.is_empty() {
            println!("      outputs: {:?}", job.outputs);
        }
        if job.directories.work_dir != workflow.dirs().root {
            println!("      dir: {}", job.directories.work_dir.display());
        }
        if job.clean_tmp {
            println!("      clean_tmp: true");
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

fn names_of<'a>(workflow: &'a Workflow, ids: &[types::JobId]) -> Vec<&'a str> {
    ids.iter()
        .filter_map(|id| workflow.job(*id))
        .map(|j| j.name.as_str())
        .collect()
}
