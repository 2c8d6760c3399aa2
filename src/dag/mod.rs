// src/dag/mod.rs

//! Job graph and scheduling.
//!
//! - [`graph`] builds the immutable job dependency graph and rejects cycles.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   jobs are ready and which task runs next.
//! - [`run_state`] provides run records and the scheduled task type.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.
//! - [`report`] summarises a run.

pub mod graph;
pub mod report;
pub mod run_state;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;

pub use graph::JobGraph;
pub use report::{RunReport, RunStatus};
pub use run_state::{JobRunState, ScheduledTask, TaskRunState};
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
