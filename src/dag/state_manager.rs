// src/dag/state_manager.rs

//! Per-run state transitions for jobs in the scheduler.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::JobGraph;
use crate::dag::run_state::{JobRecord, JobRunState, ScheduledTask};
use crate::dag::scheduler_step::SchedulerStep;
use crate::types::JobName;

/// Manages per-run state transitions for jobs.
pub struct StateManager<'a> {
    graph: &'a JobGraph,
    jobs: &'a mut BTreeMap<JobName, JobRecord>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a JobGraph, jobs: &'a mut BTreeMap<JobName, JobRecord>) -> Self {
        Self { graph, jobs }
    }

    /// Drive every job that can make progress without outside input:
    ///
    /// - `Pending` jobs whose dependencies all succeeded become `Ready`.
    /// - `Ready` jobs without tasks succeed on the spot, which may in turn
    ///   make their dependents ready.
    /// - `Ready` jobs with tasks become `Running` and their first task is
    ///   dispatched.
    ///
    /// Repeats until nothing changes. Jobs are visited in topological order so
    /// the dispatch order is deterministic.
    pub fn settle(&mut self, step: &mut SchedulerStep) {
        let graph = self.graph;
        loop {
            let mut changed = false;

            for name in graph.topological_order() {
                let state = match self.jobs.get(name) {
                    Some(job) => job.state,
                    None => continue,
                };

                match state {
                    JobRunState::Pending if self.deps_satisfied(name) => {
                        self.set_state(name, JobRunState::Ready);
                        debug!(job = %name, "dependencies satisfied; job Ready");
                        step.newly_ready.push(name.clone());
                        changed = true;
                    }
                    JobRunState::Ready => {
                        self.start_job(name, step);
                        changed = true;
                    }
                    _ => {}
                }
            }

            if !changed {
                break;
            }
        }
    }

    fn start_job(&mut self, name: &str, step: &mut SchedulerStep) {
        let has_tasks = self
            .jobs
            .get(name)
            .map(|job| !job.tasks.is_empty())
            .unwrap_or(false);

        if !has_tasks {
            info!(job = %name, "job has no tasks; succeeded");
            self.set_state(name, JobRunState::Succeeded);
            step.newly_succeeded.push(name.to_string());
            return;
        }

        self.set_state(name, JobRunState::Running);
        info!(job = %name, "starting job");
        if let Some(task) = self.dispatch_current(name) {
            step.newly_dispatched.push(task);
        }
    }

    /// Build a [`ScheduledTask`] for the task under the job's cursor.
    pub fn dispatch_current(&self, name: &str) -> Option<ScheduledTask> {
        let job = self.jobs.get(name)?;
        let record = job.current_task()?;

        let Some(spec) = self.graph.catalog().task(&record.name) else {
            warn!(job = %name, task = %record.name, "task missing from catalog");
            return None;
        };

        debug!(
            job = %name,
            task = %spec.name,
            position = job.cursor,
            "dispatching task"
        );

        Some(ScheduledTask {
            job: job.name.clone(),
            task: spec.name.clone(),
            position: job.cursor,
            command: spec.command.clone(),
            arguments: spec.arguments.clone(),
            files: self.graph.catalog().files_of(spec),
        })
    }

    /// Whether every dependency of `name` has succeeded in this run.
    pub fn deps_satisfied(&self, name: &str) -> bool {
        ReadOnlyStateManager::new(self.jobs).deps_satisfied(name)
    }

    /// Mark every transitive dependent of `failed` that has not reached a
    /// terminal state as `Skipped`.
    ///
    /// Returns the newly skipped jobs (excluding `failed` itself).
    pub fn mark_dependents_skipped(&mut self, failed: &str) -> Vec<JobName> {
        let graph = self.graph;
        let mut stack: Vec<JobName> = graph.dependents_of(failed).to_vec();
        let mut visited: HashSet<JobName> = HashSet::new();
        let mut skipped = Vec::new();

        while let Some(name) = stack.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }

            if let Some(job) = self.jobs.get_mut(&name) {
                if !job.state.is_terminal() {
                    job.state = JobRunState::Skipped;
                    debug!(
                        job = %job.name,
                        upstream = %failed,
                        "skipping job due to upstream failure"
                    );
                    skipped.push(job.name.clone());
                }
                stack.extend(graph.dependents_of(&name).iter().cloned());
            }
        }

        skipped
    }

    /// Check if all jobs are in a terminal state.
    pub fn all_jobs_terminal(&self) -> bool {
        self.jobs.values().all(|job| job.state.is_terminal())
    }

    fn set_state(&mut self, name: &str, state: JobRunState) {
        if let Some(job) = self.jobs.get_mut(name) {
            job.state = state;
        }
    }
}

/// A read-only view for checking dependency satisfaction.
///
/// Used when only shared access to the job map is available (e.g. in
/// `Scheduler::deps_satisfied`).
pub struct ReadOnlyStateManager<'a> {
    jobs: &'a BTreeMap<JobName, JobRecord>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(jobs: &'a BTreeMap<JobName, JobRecord>) -> Self {
        Self { jobs }
    }

    pub fn deps_satisfied(&self, name: &str) -> bool {
        let Some(job) = self.jobs.get(name) else {
            return false;
        };

        job.deps.iter().all(|dep| match self.jobs.get(dep) {
            Some(d) => d.state == JobRunState::Succeeded,
            None => {
                warn!(job = %name, dep = %dep, "dependency missing from run records");
                false
            }
        })
    }
}
