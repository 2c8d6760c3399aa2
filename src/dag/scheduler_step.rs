// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::run_state::ScheduledTask;
use crate::types::JobName;

/// Structured result of a single scheduler "step".
///
/// Tests use this to drive the scheduler by hand and assert on exactly what
/// changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that should be executed as a result of this step.
    pub newly_dispatched: Vec<ScheduledTask>,
    /// Jobs whose dependencies all succeeded during this step.
    pub newly_ready: Vec<JobName>,
    pub newly_succeeded: Vec<JobName>,
    pub newly_failed: Vec<JobName>,
    /// Jobs that will never run because something upstream failed.
    pub newly_skipped: Vec<JobName>,
    /// Whether this step left every job in a terminal state.
    pub run_just_finished: bool,
}

impl SchedulerStep {
    pub fn dispatched_tasks(&self) -> Vec<(&str, &str)> {
        self.newly_dispatched
            .iter()
            .map(|t| (t.job.as_str(), t.task.as_str()))
            .collect()
    }
}
