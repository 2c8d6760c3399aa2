// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::TaskOutcome;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Request that the runtime stops (every job is terminal).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Kick off the run.
pub fn handle_start(scheduler: &mut Scheduler) -> CoreStep {
    let step = scheduler.start();
    commands_for(step)
}

/// Handle a task-staged event. Never dispatches anything.
pub fn handle_task_staged(scheduler: &mut Scheduler, job: &str, task: &str) -> CoreStep {
    scheduler.handle_task_staged(job, task);
    CoreStep::continue_with(Vec::new())
}

/// Handle a task-started event. Never dispatches anything.
pub fn handle_task_started(scheduler: &mut Scheduler, job: &str, task: &str) -> CoreStep {
    scheduler.handle_task_started(job, task);
    CoreStep::continue_with(Vec::new())
}

/// Handle a task completion event.
///
/// Dispatches whatever the scheduler made ready (the next task of the same
/// job, or first tasks of newly ready jobs) and requests exit once every job
/// is terminal.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    job: &str,
    task: &str,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.handle_task_completion(job, task, outcome);
    commands_for(step)
}

/// Handle a shutdown request: skip everything that has not finished.
pub fn handle_shutdown(scheduler: &mut Scheduler) -> CoreStep {
    let cancelled = scheduler.cancel_remaining();
    info!(cancelled = cancelled.len(), "shutdown requested");
    CoreStep {
        commands: vec![CoreCommand::RequestExit],
        keep_running: false,
    }
}

fn commands_for(step: SchedulerStep) -> CoreStep {
    let mut commands = Vec::new();

    if !step.newly_dispatched.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_dispatched));
    }

    if step.run_just_finished {
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    CoreStep::continue_with(commands)
}
