// src/dag/run_state.rs

//! Run records: mutable per-run state for jobs and their tasks.

use crate::errors::TaskFailure;
use crate::registry::FileSpec;
use crate::types::{JobId, JobName, TaskName};

/// Lifecycle of a job within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobRunState {
    /// Waiting for dependencies.
    Pending,
    /// All dependencies succeeded; about to start.
    Ready,
    /// One of its tasks is in flight.
    Running,
    Succeeded,
    Failed,
    /// A job in its dependency closure failed (or the run was cancelled), so
    /// it never started.
    Skipped,
}

impl JobRunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobRunState::Succeeded | JobRunState::Failed | JobRunState::Skipped
        )
    }
}

/// Lifecycle of a task within its job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRunState {
    Pending,
    /// All referenced files are in place on the agent.
    Staged,
    Running,
    Succeeded,
    Failed,
}

impl TaskRunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskRunState::Succeeded | TaskRunState::Failed)
    }
}

/// Run record for one task slot of a job.
///
/// The same declared task may appear in several jobs; each occurrence gets its
/// own record.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub name: TaskName,
    pub state: TaskRunState,
    pub failure: Option<TaskFailure>,
}

impl TaskRecord {
    pub fn new(name: TaskName) -> Self {
        Self {
            name,
            state: TaskRunState::Pending,
            failure: None,
        }
    }
}

/// Run record for a job.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub name: JobName,
    pub id: Option<JobId>,
    pub state: JobRunState,
    /// Direct dependencies (names in `depends_on_jobs`).
    pub deps: Vec<JobName>,
    /// Task slots in declared order.
    pub tasks: Vec<TaskRecord>,
    /// Index of the task currently in flight (or next to dispatch).
    pub cursor: usize,
}

impl JobRecord {
    pub fn new(name: JobName, id: Option<JobId>, deps: Vec<JobName>, tasks: &[TaskName]) -> Self {
        Self {
            name,
            id,
            state: JobRunState::Pending,
            deps,
            tasks: tasks.iter().cloned().map(TaskRecord::new).collect(),
            cursor: 0,
        }
    }

    /// The task slot the job is currently working on, if any.
    pub fn current_task(&self) -> Option<&TaskRecord> {
        self.tasks.get(self.cursor)
    }

    pub fn task(&self, name: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// Description of a task that the scheduler wants executed now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub job: JobName,
    pub task: TaskName,
    /// Position of the task within its job.
    pub position: usize,
    pub command: String,
    pub arguments: Vec<String>,
    /// Files to stage before running `command`.
    pub files: Vec<FileSpec>,
}
