// src/engine/mod.rs

//! Orchestration engine for jobdag.
//!
//! This module ties together:
//! - the job scheduler (pure state machine, in [`crate::dag`])
//! - the main runtime event loop that reacts to:
//!   - task staged / started / completed events from workers
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. The runtime is the only writer of run
//! records: workers report through the event channel instead of touching
//! scheduler state.

use crate::errors::TaskFailure;
use crate::types::{JobName, TaskName};

/// Outcome of a task for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(TaskFailure),
}

/// Events flowing into the runtime from workers and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Every file the task refers to is on the agent.
    TaskStaged { job: JobName, task: TaskName },
    /// The task's command was handed to the execution interface.
    TaskStarted { job: JobName, task: TaskName },
    /// A task finished, successfully or not.
    TaskCompleted {
        job: JobName,
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::{run_graph, RunOptions, Runtime};
