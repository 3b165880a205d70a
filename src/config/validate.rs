// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{DependencyConfig, JobConfig, RawWorkflowFile, WorkflowFile};
use crate::errors::{GflowError, Result};

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = crate::errors::GflowError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_workflow(&raw)?;
        Ok(WorkflowFile::new_unchecked(raw.workflow, raw.job))
    }
}

/// Validate a raw definition without consuming it.
pub fn validate_workflow(raw: &RawWorkflowFile) -> Result<()> {
    validate_raw_workflow(raw)
}

fn validate_raw_workflow(raw: &RawWorkflowFile) -> Result<()> {
    ensure_has_jobs(raw)?;
    validate_workflow_section(raw)?;
    let declarations = collect_declarations(&raw.job)?;
    validate_dependencies(&declarations)?;
    validate_dag(&declarations)?;
    Ok(())
}

fn ensure_has_jobs(raw: &RawWorkflowFile) -> Result<()> {
    if raw.job.is_empty() {
        return Err(GflowError::ConfigError(
            "workflow must contain at least one [[job]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_workflow_section(raw: &RawWorkflowFile) -> Result<()> {
    if raw.workflow.max_parallel == Some(0) {
        return Err(GflowError::ConfigError(
            "[workflow].max_parallel must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

/// Collect every job declared in `jobs`, including inline dependency tables,
/// keyed by name.
///
/// The same name may appear more than once only if every declaration is
/// identical; those occurrences are the same job.
pub(crate) fn collect_declarations(jobs: &[JobConfig]) -> Result<BTreeMap<&str, &JobConfig>> {
    let mut declarations: BTreeMap<&str, &JobConfig> = BTreeMap::new();
    let mut stack: Vec<&JobConfig> = jobs.iter().rev().collect();

    while let Some(job) = stack.pop() {
        if job.name.trim().is_empty() {
            return Err(GflowError::ConfigError(
                "every job needs a non-empty `name`".to_string(),
            ));
        }

        match declarations.get(job.name.as_str()) {
            Some(existing) if *existing != job => {
                return Err(GflowError::ConfigError(format!(
                    "job '{}' is declared more than once with different definitions",
                    job.name
                )));
            }
            Some(_) => continue,
            None => {
                declarations.insert(job.name.as_str(), job);
            }
        }

        for dep in job.after.iter().rev() {
            if let DependencyConfig::Inline(inline) = dep {
                stack.push(inline.as_ref());
            }
        }
    }

    Ok(declarations)
}

fn validate_dependencies(declarations: &BTreeMap<&str, &JobConfig>) -> Result<()> {
    for (name, job) in declarations.iter() {
        for dep in job.after.iter() {
            let dep_name = dep.name();
            if !declarations.contains_key(dep_name) {
                return Err(GflowError::UnknownDependency(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep_name
                )));
            }
            if dep_name == *name {
                return Err(GflowError::DagCycle(format!(
                    "job '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(declarations: &BTreeMap<&str, &JobConfig>) -> Result<()> {
    // Edge direction: dep -> job.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in declarations.keys() {
        graph.add_node(*name);
    }

    for (name, job) in declarations.iter() {
        for dep in job.after.iter() {
            graph.add_edge(dep.name(), *name, ());
        }
    }

    // A topological sort will fail if there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(GflowError::DagCycle(format!(
            "cycle detected in job DAG involving job '{}'",
            cycle.node_id()
        ))),
    }
}
