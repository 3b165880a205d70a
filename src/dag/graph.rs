// src/dag/graph.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::job::Job;
use crate::errors::{GflowError, Result};
use crate::types::JobId;

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct dependencies: jobs that must finish before this one can start.
    deps: Vec<JobId>,
    /// Direct dependents: jobs that list this one as a dependency.
    dependents: Vec<JobId>,
}

/// Arena DAG over job IDs.
///
/// Node `i` belongs to the job with ID `i + 1`; edges are stored as IDs so the
/// graph never holds references into the jobs themselves.
#[derive(Debug, Clone)]
pub struct JobGraph {
    nodes: Vec<DagNode>,
}

impl JobGraph {
    /// Build and validate the graph for a workflow's jobs.
    ///
    /// Rejects:
    /// - IDs that do not match their arena position
    /// - dependencies on unknown jobs
    /// - self dependencies and cycles
    pub fn build(jobs: &[Job]) -> Result<Self> {
        let mut nodes = vec![DagNode::default(); jobs.len()];

        for (idx, job) in jobs.iter().enumerate() {
            if job.id.0 == 0 || job.id.index() != idx {
                return Err(GflowError::ConfigError(format!(
                    "job '{}' has id {} but is registered at position {}",
                    job.name,
                    job.id,
                    idx + 1
                )));
            }
        }

        for job in jobs {
            for dep in &job.dependencies {
                if dep.0 == 0 || dep.index() >= jobs.len() {
                    return Err(GflowError::UnknownDependency(format!(
                        "job '{}' (id {}) depends on unknown job id {}",
                        job.name, job.id, dep
                    )));
                }
                if *dep == job.id {
                    return Err(GflowError::DagCycle(format!(
                        "job '{}' (id {}) depends on itself",
                        job.name, job.id
                    )));
                }
                nodes[job.id.index()].deps.push(*dep);
                nodes[dep.index()].dependents.push(job.id);
            }
        }

        let graph = Self { nodes };
        graph.ensure_acyclic(jobs)?;
        Ok(graph)
    }

    fn ensure_acyclic(&self, jobs: &[Job]) -> Result<()> {
        // Edge direction: dep -> job.
        let mut graph: DiGraphMap<JobId, ()> = DiGraphMap::new();

        for id in self.job_ids() {
            graph.add_node(id);
        }
        for id in self.job_ids() {
            for dep in self.dependencies_of(id) {
                graph.add_edge(*dep, id, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => {
                let id = cycle.node_id();
                let name = jobs
                    .get(id.index())
                    .map(|j| j.name.as_str())
                    .unwrap_or("?");
                Err(GflowError::DagCycle(format!(
                    "cycle detected in job DAG involving job '{}' (id {})",
                    name, id
                )))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All job IDs in registration order.
    pub fn job_ids(&self) -> impl Iterator<Item = JobId> + '_ {
        (1..=self.nodes.len() as u64).map(JobId)
    }

    /// Jobs without dependencies.
    pub fn roots(&self) -> Vec<JobId> {
        self.job_ids()
            .filter(|id| self.dependencies_of(*id).is_empty())
            .collect()
    }

    /// Immediate dependencies of a job.
    pub fn dependencies_of(&self, id: JobId) -> &[JobId] {
        self.node(id).map(|n| n.deps.as_slice()).unwrap_or(&[])
    }

    /// Immediate dependents of a job.
    pub fn dependents_of(&self, id: JobId) -> &[JobId] {
        self.node(id)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Every job downstream of `id`, in ascending ID order.
    pub fn transitive_dependents(&self, id: JobId) -> Vec<JobId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack: Vec<JobId> = self.dependents_of(id).to_vec();

        while let Some(next) = stack.pop() {
            if std::mem::replace(&mut seen[next.index()], true) {
                continue;
            }
            stack.extend_from_slice(self.dependents_of(next));
        }

        self.job_ids().filter(|j| seen[j.index()]).collect()
    }

    fn node(&self, id: JobId) -> Option<&DagNode> {
        if id.0 == 0 {
            return None;
        }
        self.nodes.get(id.index())
    }
}
