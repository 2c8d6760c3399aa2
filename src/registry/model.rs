// src/registry/model.rs

//! Declaration records for files, tasks and jobs.
//!
//! These are plain immutable values once handed to the [`Registry`]. The
//! chainable constructors exist so that both the config loader and tests can
//! build them without spelling out every field.
//!
//! [`Registry`]: crate::registry::Registry

use crate::registry::OrderedSet;
use crate::types::{FileName, JobId, JobName, TaskName};

/// A named artifact that has to be present on the agent before a task that
/// refers to it can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub name: FileName,
    /// Path on the execution agent.
    pub agent_path: String,
    /// Path on the controlling side.
    pub local_path: String,
    pub executable: bool,
}

impl FileSpec {
    /// A non-executable file whose agent and local paths are both `name`.
    pub fn new(name: impl Into<FileName>) -> Self {
        let name = name.into();
        Self {
            agent_path: name.clone(),
            local_path: name.clone(),
            name,
            executable: false,
        }
    }

    pub fn agent_path(mut self, path: impl Into<String>) -> Self {
        self.agent_path = path.into();
        self
    }

    pub fn local_path(mut self, path: impl Into<String>) -> Self {
        self.local_path = path.into();
        self
    }

    pub fn executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: TaskName,
    pub command: String,
    pub arguments: Vec<String>,
    /// Files that must be staged before the command runs.
    pub refers_to: OrderedSet<FileName>,
}

impl TaskSpec {
    pub fn new(name: impl Into<TaskName>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            arguments: Vec::new(),
            refers_to: OrderedSet::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn refers_to(mut self, file: impl Into<FileName>) -> Self {
        self.refers_to.insert(file.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: JobName,
    /// Tasks in execution order.
    pub tasks: OrderedSet<TaskName>,
    /// Jobs that must all succeed before this one becomes ready.
    pub depends_on_jobs: OrderedSet<JobName>,
    pub id: Option<JobId>,
}

impl JobSpec {
    pub fn new(name: impl Into<JobName>) -> Self {
        Self {
            name: name.into(),
            tasks: OrderedSet::new(),
            depends_on_jobs: OrderedSet::new(),
            id: None,
        }
    }

    pub fn task(mut self, task: impl Into<TaskName>) -> Self {
        self.tasks.insert(task.into());
        self
    }

    pub fn depends_on(mut self, job: impl Into<JobName>) -> Self {
        self.depends_on_jobs.insert(job.into());
        self
    }

    pub fn id(mut self, id: JobId) -> Self {
        self.id = Some(id);
        self
    }

    /// A job without tasks only gates its dependents.
    pub fn is_barrier(&self) -> bool {
        self.tasks.is_empty()
    }
}
