// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`process`] defines the [`Executor`] execution interface and the
//!   [`ProcessExecutor`] that spawns real child processes.
//! - [`executor_loop`] owns the bounded worker pool.
//! - [`task_runner`] stages a task's files, runs it, and reports back.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `RealExecutorBackend` that the runtime uses in production.

pub mod backend;
pub mod executor_loop;
pub mod process;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use process::{ExecOutput, Executor, ProcessExecutor};
