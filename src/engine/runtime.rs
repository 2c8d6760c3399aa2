use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{JobGraph, RunReport, ScheduledTask, Scheduler};
use crate::errors::Result;
use crate::exec::{Executor, ExecutorBackend, RealExecutorBackend};
use crate::staging::{StagingCoordinator, Transfer};

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s, and delegates
/// actual task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. Being the only consumer of the event channel, it is
/// also the single writer of run records.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the run and dispatches the initial tasks.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the
    ///   core runtime.
    /// - Executes commands returned by the core until every job is terminal.
    ///
    /// Returns the final report.
    pub async fn run(mut self) -> Result<RunReport> {
        info!("jobdag runtime started");

        let step = self.core.start();
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    warn!("runtime event channel closed before run finished");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        let report = self.core.report();
        info!(status = ?report.status, "runtime exiting");
        Ok(report)
    }

    /// Execute the commands of one core step; returns whether to keep going.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        if !step.keep_running {
            info!("core requested exit; stopping runtime");
        }
        Ok(step.keep_running)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => {
                self.spawn_ready(tasks).await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks
            .iter()
            .map(|t| format!("{}/{}", t.job, t.task))
            .collect();
        debug!(?names, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}

/// Options for [`run_graph`].
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Upper bound on tasks staging or executing at the same time.
    pub max_parallel_tasks: usize,
    /// Translate Ctrl-C into a graceful shutdown.
    pub handle_ctrl_c: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_parallel_tasks: 4,
            handle_ctrl_c: false,
        }
    }
}

/// Run every job of `graph` to a terminal state using the production worker
/// pool, and return the final report.
///
/// Staging and execution failures do not make this return `Err`; they are
/// recorded in the report. `Err` means the runtime itself broke down.
pub async fn run_graph<X, T>(
    graph: JobGraph,
    executor: Arc<X>,
    staging: Arc<StagingCoordinator<T>>,
    options: RunOptions,
) -> Result<RunReport>
where
    X: Executor,
    T: Transfer + 'static,
{
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let backend =
        RealExecutorBackend::new(rt_tx.clone(), executor, staging, options.max_parallel_tasks);

    // Ctrl-C → graceful shutdown.
    if options.handle_ctrl_c {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }
    drop(rt_tx);

    let core = CoreRuntime::new(Scheduler::new(graph));
    Runtime::new(core, rt_rx, backend).run().await
}
