use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::dag::graph::JobGraph;
use crate::dag::report::{RunReport, RunStatus};
use crate::dag::run_state::{JobRecord, JobRunState, TaskRunState};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::engine::TaskOutcome;
use crate::types::JobName;

/// Scheduler holds the immutable job graph plus the mutable run records.
///
/// It is a synchronous state machine: it never performs IO and never waits.
/// Callers feed it task lifecycle events and execute whatever it dispatches.
///
/// It is responsible for:
/// - promoting jobs to Ready once all their dependencies succeeded
/// - dispatching a job's tasks one at a time, in declared order
/// - failing a job when one of its tasks fails
/// - skipping everything downstream of a failed job
#[derive(Debug)]
pub struct Scheduler {
    graph: JobGraph,
    jobs: BTreeMap<JobName, JobRecord>,
    started: bool,
}

impl Scheduler {
    pub fn new(graph: JobGraph) -> Self {
        let mut jobs = BTreeMap::new();

        for name in graph.jobs() {
            let id = graph.catalog().job(name).and_then(|j| j.id.clone());
            let record = JobRecord::new(
                name.to_string(),
                id,
                graph.dependencies_of(name).to_vec(),
                graph.tasks_of(name),
            );
            jobs.insert(name.to_string(), record);
        }

        Self {
            graph,
            jobs,
            started: false,
        }
    }

    /// Begin the run: every job without dependencies becomes Ready and starts.
    ///
    /// Calling this more than once has no effect after the first call.
    pub fn start(&mut self) -> SchedulerStep {
        let mut step = SchedulerStep::default();
        if self.started {
            warn!("scheduler already started; ignoring");
            return step;
        }
        self.started = true;

        info!(jobs = self.jobs.len(), "scheduler: starting run");

        let mut manager = StateManager::new(&self.graph, &mut self.jobs);
        manager.settle(&mut step);
        step.run_just_finished = manager.all_jobs_terminal();
        step
    }

    /// Returns `true` once every job is Succeeded, Failed or Skipped.
    pub fn is_finished(&self) -> bool {
        self.jobs.values().all(|job| job.state.is_terminal())
    }

    pub fn job_state(&self, job: &str) -> Option<JobRunState> {
        self.jobs.get(job).map(|j| j.state)
    }

    pub fn task_state(&self, job: &str, task: &str) -> Option<TaskRunState> {
        self.jobs.get(job)?.task(task).map(|t| t.state)
    }

    /// Whether the dependencies of `job` have all succeeded.
    ///
    /// Returns `None` if the job is unknown.
    pub fn deps_satisfied(&self, job: &str) -> Option<bool> {
        if !self.jobs.contains_key(job) {
            return None;
        }
        Some(ReadOnlyStateManager::new(&self.jobs).deps_satisfied(job))
    }

    /// All files of the task have been staged on the agent.
    pub fn handle_task_staged(&mut self, job: &str, task: &str) {
        self.advance_current_task(job, task, TaskRunState::Pending, TaskRunState::Staged);
    }

    /// The task's command has been handed to the execution interface.
    pub fn handle_task_started(&mut self, job: &str, task: &str) {
        self.advance_current_task(job, task, TaskRunState::Staged, TaskRunState::Running);
    }

    /// Handle the final outcome of a task.
    pub fn handle_task_completion(
        &mut self,
        job: &str,
        task: &str,
        outcome: TaskOutcome,
    ) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        let Some(record) = self.jobs.get_mut(job) else {
            warn!(job = %job, task = %task, "completion for unknown job; ignoring");
            return step;
        };

        if record.state != JobRunState::Running {
            warn!(
                job = %job,
                task = %task,
                state = ?record.state,
                "completion for job that is not running; ignoring"
            );
            return step;
        }

        let cursor = record.cursor;
        match record.tasks.get_mut(cursor) {
            Some(slot) if slot.name == task && !slot.state.is_terminal() => match outcome {
                TaskOutcome::Success => {
                    slot.state = TaskRunState::Succeeded;
                    debug!(job = %job, task = %task, "task succeeded");
                    record.cursor += 1;

                    if record.cursor < record.tasks.len() {
                        let manager = StateManager::new(&self.graph, &mut self.jobs);
                        if let Some(next) = manager.dispatch_current(job) {
                            step.newly_dispatched.push(next);
                        }
                    } else {
                        record.state = JobRunState::Succeeded;
                        info!(job = %job, "job succeeded");
                        step.newly_succeeded.push(job.to_string());

                        let mut manager = StateManager::new(&self.graph, &mut self.jobs);
                        manager.settle(&mut step);
                    }
                }
                TaskOutcome::Failed(failure) => {
                    warn!(
                        job = %job,
                        task = %task,
                        error = %failure,
                        "task failed; failing job and skipping dependents"
                    );
                    slot.state = TaskRunState::Failed;
                    slot.failure = Some(failure);
                    record.state = JobRunState::Failed;
                    step.newly_failed.push(job.to_string());

                    let mut manager = StateManager::new(&self.graph, &mut self.jobs);
                    step.newly_skipped = manager.mark_dependents_skipped(job);
                }
            },
            _ => {
                warn!(
                    job = %job,
                    task = %task,
                    cursor,
                    "completion for task that is not in flight; ignoring"
                );
                return step;
            }
        }

        step.run_just_finished = self.is_finished();
        if step.run_just_finished {
            info!("scheduler: all jobs terminal; run finished");
        }
        step
    }

    /// Skip every job that has not reached a terminal state yet.
    ///
    /// Used when the run is aborted (e.g. Ctrl-C).
    pub fn cancel_remaining(&mut self) -> Vec<JobName> {
        let mut cancelled = Vec::new();
        for job in self.jobs.values_mut() {
            if !job.state.is_terminal() {
                debug!(job = %job.name, state = ?job.state, "cancelling job");
                job.state = JobRunState::Skipped;
                cancelled.push(job.name.clone());
            }
        }
        if !cancelled.is_empty() {
            warn!(?cancelled, "run cancelled; remaining jobs skipped");
        }
        cancelled
    }

    /// Snapshot of every job and task state.
    pub fn report(&self) -> RunReport {
        RunReport::from_records(self.jobs.values())
    }

    /// Overall status so far: Succeeded only when every job succeeded.
    pub fn status(&self) -> RunStatus {
        self.report().status
    }

    fn advance_current_task(
        &mut self,
        job: &str,
        task: &str,
        from: TaskRunState,
        to: TaskRunState,
    ) {
        let Some(record) = self.jobs.get_mut(job) else {
            warn!(job = %job, task = %task, "event for unknown job; ignoring");
            return;
        };

        let cursor = record.cursor;
        match record.tasks.get_mut(cursor) {
            Some(slot) if slot.name == task && slot.state == from => {
                slot.state = to;
                debug!(job = %job, task = %task, state = ?to, "task state changed");
            }
            other => {
                warn!(
                    job = %job,
                    task = %task,
                    expected = ?from,
                    actual = ?other.map(|s| s.state),
                    "unexpected task transition; ignoring"
                );
            }
        }
    }
}
