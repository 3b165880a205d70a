// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::errors::Result;

/// Top-level workflow definition as read from a TOML file.
///
/// ```toml
/// [workflow]
/// dir = "build"
/// max_parallel = 4
///
/// [[job]]
/// name = "fetch"
/// cmd = "curl -o data.csv https://example.com/data.csv"
/// outputs = ["data.csv"]
///
/// [[job]]
/// name = "report"
/// cmd = "python report.py data.csv"
/// after = ["fetch", { name = "setup", cmd = "pip install -r req.txt" }]
/// clean_tmp = true
/// ```
///
/// This is the raw, unvalidated form; see [`WorkflowFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowFile {
    /// Global settings from `[workflow]`.
    #[serde(default)]
    pub workflow: WorkflowSection,

    /// All jobs from `[[job]]`, in declaration order.
    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// A workflow definition that passed validation: every dependency name
/// resolves, names are unambiguous and the graph is acyclic.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    pub workflow: WorkflowSection,
    pub job: Vec<JobConfig>,
}

impl WorkflowFile {
    /// Construct without validation. Prefer `WorkflowFile::try_from(raw)`.
    pub fn new_unchecked(workflow: WorkflowSection, job: Vec<JobConfig>) -> Self {
        Self { workflow, job }
    }

    /// Every job declared anywhere in the file (top level or inline),
    /// keyed by name.
    pub fn declarations(&self) -> Result<BTreeMap<&str, &JobConfig>> {
        crate::config::validate::collect_declarations(&self.job)
    }
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSection {
    /// Workflow root, relative to the definition file. Holds `.gflow/`.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Maximum number of jobs running at once (unbounded if absent).
    #[serde(default)]
    pub max_parallel: Option<usize>,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            max_parallel: None,
        }
    }
}

/// One `[[job]]` entry (or an inline dependency table).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobConfig {
    /// Declared identity; references in `after` resolve against it.
    pub name: String,

    /// Shell command to run.
    pub cmd: String,

    /// Working directory relative to the workflow root.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Paths the job is expected to produce. Informational only.
    #[serde(default)]
    pub outputs: Vec<PathBuf>,

    /// Remove the job's scratch directory once it finishes.
    #[serde(default)]
    pub clean_tmp: bool,

    /// Jobs that must succeed before this one starts.
    #[serde(default)]
    pub after: Vec<DependencyConfig>,
}

/// A dependency: either the name of a job declared elsewhere or a full job
/// declared inline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DependencyConfig {
    Name(String),
    Inline(Box<JobConfig>),
}

impl DependencyConfig {
    pub fn name(&self) -> &str {
        match self {
            DependencyConfig::Name(name) => name,
            DependencyConfig::Inline(job) => &job.name,
        }
    }
}
