// src/dag/graph.rs

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{JobdagError, Result};
use crate::registry::Catalog;
use crate::types::{JobName, TaskName};

/// Internal node structure: stores immediate deps, dependents and the job's
/// task sequence.
#[derive(Debug, Clone)]
struct JobNode {
    /// Jobs that must succeed before this one can become ready.
    deps: Vec<JobName>,
    /// Jobs that list this one in `depends_on_jobs`.
    dependents: Vec<JobName>,
    /// Declared task order. This is a sequence, not a graph.
    tasks: Vec<TaskName>,
}

/// Immutable dependency graph over the jobs of a [`Catalog`].
///
/// Building the graph is the point where cycles are rejected, so holding a
/// `JobGraph` means the dependency relation is acyclic.
#[derive(Debug, Clone)]
pub struct JobGraph {
    catalog: Catalog,
    nodes: BTreeMap<JobName, JobNode>,
    order: Vec<JobName>,
}

impl JobGraph {
    /// Build the job graph from a finalized catalog.
    ///
    /// Fails with [`JobdagError::CyclicDependency`] carrying the jobs on the
    /// offending cycle, in dependency order.
    pub fn build(catalog: Catalog) -> Result<Self> {
        let mut nodes: BTreeMap<JobName, JobNode> = BTreeMap::new();

        for job in catalog.jobs() {
            nodes.insert(
                job.name.clone(),
                JobNode {
                    deps: job.depends_on_jobs.iter().cloned().collect(),
                    dependents: Vec::new(),
                    tasks: job.tasks.iter().cloned().collect(),
                },
            );
        }

        let names: Vec<JobName> = nodes.keys().cloned().collect();
        for name in &names {
            let deps = nodes.get(name).map(|n| n.deps.clone()).unwrap_or_default();
            for dep in deps {
                if let Some(dep_node) = nodes.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        let order = topological_order(&nodes)?;
        debug!(?order, "job graph built");

        Ok(Self {
            catalog,
            nodes,
            order,
        })
    }

    /// The declarations this graph was built from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// All job names, in name order.
    pub fn jobs(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, job: &str) -> bool {
        self.nodes.contains_key(job)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a job (its `depends_on_jobs`).
    pub fn dependencies_of(&self, job: &str) -> &[JobName] {
        self.nodes
            .get(job)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a job.
    pub fn dependents_of(&self, job: &str) -> &[JobName] {
        self.nodes
            .get(job)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks of a job in declared order.
    pub fn tasks_of(&self, job: &str) -> &[TaskName] {
        self.nodes
            .get(job)
            .map(|n| n.tasks.as_slice())
            .unwrap_or(&[])
    }

    /// A feasible execution order: every job appears after all of its
    /// dependencies.
    pub fn topological_order(&self) -> &[JobName] {
        &self.order
    }

    /// Jobs without dependencies.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(name, _)| name.as_str())
    }
}

/// Sort jobs topologically, or report a cycle.
///
/// Edge direction: dep -> job. For `job2` depending on `job0`, we add edge
/// `job0 -> job2`.
fn topological_order(nodes: &BTreeMap<JobName, JobNode>) -> Result<Vec<JobName>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in nodes.keys() {
        graph.add_node(name.as_str());
    }
    for (name, node) in nodes {
        for dep in &node.deps {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => {
            let start = cycle.node_id();
            let path = find_cycle(nodes).unwrap_or_else(|| vec![start.to_string()]);
            Err(JobdagError::CyclicDependency { cycle: path })
        }
    }
}

/// Depth-first search with a recursion stack, returning the first cycle found
/// as the list of jobs on it (without repeating the first job at the end).
fn find_cycle(nodes: &BTreeMap<JobName, JobNode>) -> Option<Vec<JobName>> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut path: Vec<&str> = Vec::new();

    for name in nodes.keys() {
        if !visited.contains(name.as_str()) {
            if let Some(cycle) = visit(name, nodes, &mut visited, &mut on_stack, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a>(
    name: &'a str,
    nodes: &'a BTreeMap<JobName, JobNode>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<JobName>> {
    visited.insert(name);
    on_stack.insert(name);
    path.push(name);

    if let Some(node) = nodes.get(name) {
        for dep in &node.deps {
            let dep = dep.as_str();
            if on_stack.contains(dep) {
                let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                // `path` follows dependency edges (job -> its dep), so reverse
                // it to list the cycle in execution order.
                let mut cycle: Vec<JobName> =
                    path[start..].iter().map(|s| s.to_string()).collect();
                cycle.reverse();
                return Some(cycle);
            }
            if !visited.contains(dep) {
                if let Some(cycle) = visit(dep, nodes, visited, on_stack, path) {
                    return Some(cycle);
                }
            }
        }
    }

    on_stack.remove(name);
    path.pop();
    None
}
