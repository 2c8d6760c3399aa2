// src/dag/report.rs

//! End-of-run summary.

use std::collections::BTreeMap;
use std::fmt;

use crate::dag::run_state::{JobRecord, JobRunState, TaskRunState};
use crate::errors::TaskFailure;
use crate::types::{JobId, JobName, TaskName};

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every job succeeded.
    Succeeded,
    /// At least one job failed, was skipped, or never finished.
    Failed,
}

impl RunStatus {
    /// Process exit code used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Succeeded => 0,
            RunStatus::Failed => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobSummary {
    pub state: JobRunState,
    pub id: Option<JobId>,
    /// Task states in declared order.
    pub tasks: Vec<(TaskName, TaskRunState)>,
}

/// Snapshot of every job and task state, plus the failures that caused them.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub jobs: BTreeMap<JobName, JobSummary>,
    /// `(job, task)` → failure, for every failed task.
    pub failures: BTreeMap<(JobName, TaskName), TaskFailure>,
}

impl RunReport {
    pub(crate) fn from_records<'a>(records: impl Iterator<Item = &'a JobRecord>) -> Self {
        let mut jobs = BTreeMap::new();
        let mut failures = BTreeMap::new();

        for record in records {
            for task in &record.tasks {
                if let Some(failure) = &task.failure {
                    failures.insert((record.name.clone(), task.name.clone()), failure.clone());
                }
            }
            jobs.insert(
                record.name.clone(),
                JobSummary {
                    state: record.state,
                    id: record.id.clone(),
                    tasks: record
                        .tasks
                        .iter()
                        .map(|t| (t.name.clone(), t.state))
                        .collect(),
                },
            );
        }

        let status = if jobs.values().all(|j| j.state == JobRunState::Succeeded) {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };

        Self {
            status,
            jobs,
            failures,
        }
    }

    pub fn job_state(&self, job: &str) -> Option<JobRunState> {
        self.jobs.get(job).map(|j| j.state)
    }

    pub fn task_state(&self, job: &str, task: &str) -> Option<TaskRunState> {
        self.jobs
            .get(job)?
            .tasks
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, state)| *state)
    }

    pub fn failure(&self, job: &str, task: &str) -> Option<&TaskFailure> {
        self.failures.get(&(job.to_string(), task.to_string()))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {:?}", self.status)?;
        for (name, job) in &self.jobs {
            match &job.id {
                Some(id) => writeln!(f, "  job {name} [{id}]: {:?}", job.state)?,
                None => writeln!(f, "  job {name}: {:?}", job.state)?,
            }
            for (task, state) in &job.tasks {
                writeln!(f, "    task {task}: {state:?}")?;
                if let Some(failure) = self.failures.get(&(name.clone(), task.clone())) {
                    writeln!(f, "      error: {failure}")?;
                }
            }
        }
        Ok(())
    }
}
