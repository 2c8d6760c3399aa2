#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use jobdag::dag::ScheduledTask;
use jobdag::engine::{RuntimeEvent, TaskOutcome};
use jobdag::errors::{ExecutionError, Result, TaskFailure};
use jobdag::exec::{ExecOutput, Executor, ExecutorBackend};

/// Something the fake executor observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
}

/// A fake [`Executor`] that:
/// - records when each invocation starts and finishes
/// - sleeps for a configurable delay in between
/// - exits 0 unless an exit code was scripted for the invocation.
///
/// Invocations are identified by their label: the command followed by its
/// arguments, space separated (e.g. `"/usr/bin/bc -q bc_exp1.txt"`).
#[derive(Default)]
pub struct FakeExecutor {
    delay: Duration,
    exit_codes: Mutex<HashMap<String, i32>>,
    unavailable: Mutex<HashSet<String>>,
    events: Mutex<Vec<ExecEvent>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn label(command: &str, arguments: &[String]) -> String {
        std::iter::once(command)
            .chain(arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Make the invocation with this label exit with `code`.
    pub fn exit_with(&self, label: &str, code: i32) {
        self.exit_codes.lock().unwrap().insert(label.to_string(), code);
    }

    /// Make every invocation of `command` fail to start.
    pub fn unavailable(&self, command: &str) {
        self.unavailable.lock().unwrap().insert(command.to_string());
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Labels in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(label) => Some(label),
                ExecEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn was_run(&self, label: &str) -> bool {
        self.started().iter().any(|l| l == label)
    }

    /// Highest number of invocations that were running at the same time.
    pub fn max_concurrency(&self) -> usize {
        let mut running = 0usize;
        let mut max = 0usize;
        for event in self.events() {
            match event {
                ExecEvent::Started(_) => {
                    running += 1;
                    max = max.max(running);
                }
                ExecEvent::Finished(_) => running = running.saturating_sub(1),
            }
        }
        max
    }

    /// Position of `label`'s start event, if it ran.
    pub fn start_index(&self, label: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| *e == ExecEvent::Started(label.to_string()))
    }

    /// Position of `label`'s finish event, if it finished.
    pub fn finish_index(&self, label: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| *e == ExecEvent::Finished(label.to_string()))
    }
}

impl Executor for FakeExecutor {
    fn execute<'a>(
        &'a self,
        command: &'a str,
        arguments: &'a [String],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ExecOutput>> + Send + 'a>> {
        Box::pin(async move {
            if self.unavailable.lock().unwrap().contains(command) {
                anyhow::bail!("no such command: {command}");
            }

            let label = Self::label(command, arguments);
            self.events.lock().unwrap().push(ExecEvent::Started(label.clone()));

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let exit_code = self
                .exit_codes
                .lock()
                .unwrap()
                .get(&label)
                .copied()
                .unwrap_or(0);
            self.events.lock().unwrap().push(ExecEvent::Finished(label.clone()));

            Ok(ExecOutput {
                exit_code,
                stdout: label,
                stderr: String::new(),
            })
        })
    }
}

/// A fake [`ExecutorBackend`] that bypasses staging and processes:
/// - records which `(job, task)` pairs were dispatched
/// - immediately reports staged, started and completed for each one,
///   failing the tasks listed in `failing`.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<(String, String)>>>,
    failing: HashSet<String>,
}

impl FakeBackend {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<(String, String)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            dispatched,
            failing: HashSet::new(),
        }
    }

    /// Report the named task as exiting with code 1.
    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }
}

impl ExecutorBackend for FakeBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let failing = self.failing.clone();

        Box::pin(async move {
            for t in tasks {
                dispatched
                    .lock()
                    .unwrap()
                    .push((t.job.clone(), t.task.clone()));

                let outcome = if failing.contains(&t.task) {
                    TaskOutcome::Failed(TaskFailure::Execution(ExecutionError {
                        job: t.job.clone(),
                        task: t.task.clone(),
                        exit_code: 1,
                        stdout: String::new(),
                        stderr: "scripted failure".to_string(),
                    }))
                } else {
                    TaskOutcome::Success
                };

                for event in [
                    RuntimeEvent::TaskStaged {
                        job: t.job.clone(),
                        task: t.task.clone(),
                    },
                    RuntimeEvent::TaskStarted {
                        job: t.job.clone(),
                        task: t.task.clone(),
                    },
                    RuntimeEvent::TaskCompleted {
                        job: t.job.clone(),
                        task: t.task.clone(),
                        outcome,
                    },
                ] {
                    tx.send(event).await.map_err(anyhow::Error::from)?;
                }
            }
            Ok(())
        })
    }
}
