#![allow(dead_code)]

use std::path::PathBuf;

use gflow::config::{DependencyConfig, JobConfig, RawWorkflowFile, WorkflowFile, WorkflowSection};
use gflow::errors::Result;

/// Builder for `WorkflowFile` to simplify test setup.
pub struct WorkflowFileBuilder {
    raw: RawWorkflowFile,
}

impl WorkflowFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawWorkflowFile {
                workflow: WorkflowSection::default(),
                job: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.raw.job.push(job);
        self
    }

    pub fn max_parallel(mut self, n: usize) -> Self {
        self.raw.workflow.max_parallel = Some(n);
        self
    }

    /// Validate and build; panics on an invalid definition.
    pub fn build(self) -> WorkflowFile {
        WorkflowFile::try_from(self.raw).expect("Failed to build valid workflow from builder")
    }

    /// Validate and build, returning the validation error.
    pub fn try_build(self) -> Result<WorkflowFile> {
        WorkflowFile::try_from(self.raw)
    }
}

impl Default for WorkflowFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                dir: None,
                outputs: vec![],
                clean_tmp: false,
                after: vec![],
            },
        }
    }

    /// Depend on a job declared elsewhere, by name.
    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(DependencyConfig::Name(dep.to_string()));
        self
    }

    /// Depend on a job declared inline.
    pub fn after_inline(mut self, dep: JobConfig) -> Self {
        self.job.after.push(DependencyConfig::Inline(Box::new(dep)));
        self
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.job.dir = Some(PathBuf::from(dir));
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.job.outputs.push(PathBuf::from(path));
        self
    }

    pub fn clean_tmp(mut self, val: bool) -> Self {
        self.job.clean_tmp = val;
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
