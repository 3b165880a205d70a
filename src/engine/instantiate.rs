// src/engine/instantiate.rs

//! Turning a workflow definition into linked, registered jobs.
//!
//! Dependencies are resolved by declared name: every reference to the same
//! name, whether a plain `"name"` or an inline table, resolves to a single
//! job. Dependencies are registered before their dependents (depth-first, in
//! declaration order), so IDs are deterministic for a given definition.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::debug;

use crate::config::{DependencyConfig, JobConfig, WorkflowFile};
use crate::dag::JobSpec;
use crate::engine::workflow::{RunOptions, Workflow};
use crate::errors::{GflowError, Result};
use crate::types::JobId;

impl From<&JobConfig> for JobSpec {
    fn from(cfg: &JobConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            cmd: cfg.cmd.clone(),
            work_dir: cfg.dir.clone(),
            outputs: cfg.outputs.clone(),
            clean_tmp: cfg.clean_tmp,
        }
    }
}

impl Workflow {
    /// Build a workflow rooted at `root` from a validated definition.
    pub fn from_definition(def: &WorkflowFile, root: impl AsRef<Path>) -> Result<Self> {
        let mut workflow = Workflow::new(root)?;
        workflow.set_options(RunOptions {
            max_parallel: def.workflow.max_parallel,
            ..RunOptions::default()
        });

        let declarations = def.declarations()?;
        let mut resolver = Resolver {
            declarations: &declarations,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
        };

        for job in &def.job {
            resolver.instantiate(&mut workflow, job)?;
        }

        debug!(jobs = workflow.jobs().len(), "workflow instantiated from definition");
        Ok(workflow)
    }
}

struct Resolver<'a> {
    declarations: &'a BTreeMap<&'a str, &'a JobConfig>,
    resolved: HashMap<String, JobId>,
    /// Names currently being instantiated, outermost first.
    in_progress: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn instantiate(&mut self, workflow: &mut Workflow, cfg: &'a JobConfig) -> Result<JobId> {
        if let Some(id) = self.resolved.get(&cfg.name) {
            return Ok(*id);
        }

        if self.in_progress.contains(&cfg.name) {
            return Err(GflowError::DagCycle(format!(
                "cycle detected in job DAG: {} -> {}",
                self.in_progress.join(" -> "),
                cfg.name
            )));
        }
        self.in_progress.push(cfg.name.clone());

        let mut deps = Vec::with_capacity(cfg.after.len());
        for dep in &cfg.after {
            let dep_cfg = match dep {
                DependencyConfig::Inline(job) => job.as_ref(),
                DependencyConfig::Name(name) => {
                    self.declarations.get(name.as_str()).copied().ok_or_else(|| {
                        GflowError::UnknownDependency(format!(
                            "job '{}' has unknown dependency '{}' in `after`",
                            cfg.name, name
                        ))
                    })?
                }
            };
            deps.push(self.instantiate(workflow, dep_cfg)?);
        }

        self.in_progress.pop();

        let id = workflow.add_job(JobSpec::from(cfg), &deps)?;
        self.resolved.insert(cfg.name.clone(), id);
        Ok(id)
    }
}
