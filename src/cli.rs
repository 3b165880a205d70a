// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gflow",
    version,
    about = "Run a workflow of dependent jobs concurrently.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow definition (TOML).
    ///
    /// Default: `Gflow.toml` in the current working directory.
    #[arg(long, short = 'w', value_name = "PATH", default_value = "Gflow.toml")]
    pub workflow: PathBuf,

    /// Override `[workflow].dir`; the `.gflow/` state directory goes here.
    #[arg(long, value_name = "DIR")]
    pub workflow_dir: Option<PathBuf>,

    /// Maximum number of jobs running at once (overrides the definition).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_parallel: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the jobs, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip writing `.gflow/wf.json` after the run.
    #[arg(long)]
    pub no_summary: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
