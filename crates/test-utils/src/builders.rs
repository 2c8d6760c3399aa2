#![allow(dead_code)]

use jobdag::dag::{JobGraph, Scheduler};
use jobdag::errors::Result;
use jobdag::registry::{Catalog, FileSpec, JobSpec, Registry, TaskSpec};
use jobdag::types::JobId;

/// Builder for a [`Registry`] to simplify test setup.
///
/// Declarations are recorded in call order and replayed on `build_*`, so
/// duplicate and dangling declarations surface from the registry itself.
#[derive(Default)]
pub struct RegistryBuilder {
    files: Vec<FileSpec>,
    tasks: Vec<TaskSpec>,
    jobs: Vec<JobSpec>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain file whose agent and local paths equal its name.
    pub fn file(self, name: &str) -> Self {
        self.file_spec(FileSpec::new(name))
    }

    pub fn executable_file(self, name: &str) -> Self {
        self.file_spec(FileSpec::new(name).executable(true))
    }

    pub fn file_spec(mut self, file: FileSpec) -> Self {
        self.files.push(file);
        self
    }

    /// Task running `command` with `args`, referring to `files`.
    pub fn task(self, name: &str, command: &str, args: &[&str], files: &[&str]) -> Self {
        let mut task = TaskSpec::new(name, command).args(args.iter().copied());
        for file in files {
            task = task.refers_to(*file);
        }
        self.task_spec(task)
    }

    pub fn task_spec(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Job running `tasks` in order once every job in `deps` succeeded.
    pub fn job(self, name: &str, tasks: &[&str], deps: &[&str]) -> Self {
        self.job_spec(job_spec(name, tasks, deps))
    }

    pub fn job_with_id(self, name: &str, tasks: &[&str], deps: &[&str], id: JobId) -> Self {
        self.job_spec(job_spec(name, tasks, deps).id(id))
    }

    pub fn job_spec(mut self, job: JobSpec) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn try_registry(self) -> Result<Registry> {
        let mut registry = Registry::new();
        for file in self.files {
            registry.declare_file(file)?;
        }
        for task in self.tasks {
            registry.declare_task(task)?;
        }
        for job in self.jobs {
            registry.declare_job(job)?;
        }
        Ok(registry)
    }

    pub fn try_catalog(self) -> Result<Catalog> {
        self.try_registry()?.finalize()
    }

    pub fn try_graph(self) -> Result<JobGraph> {
        JobGraph::build(self.try_catalog()?)
    }

    pub fn catalog(self) -> Catalog {
        self.try_catalog().expect("Failed to build valid catalog from builder")
    }

    pub fn graph(self) -> JobGraph {
        self.try_graph().expect("Failed to build valid job graph from builder")
    }

    pub fn scheduler(self) -> Scheduler {
        Scheduler::new(self.graph())
    }
}

fn job_spec(name: &str, tasks: &[&str], deps: &[&str]) -> JobSpec {
    let mut job = JobSpec::new(name);
    for task in tasks {
        job = job.task(*task);
    }
    for dep in deps {
        job = job.depends_on(*dep);
    }
    job
}

/// Every job has one task `t_<job>` running `true`, no files.
pub fn chain_graph(edges: &[(&str, &[&str])]) -> JobGraph {
    let mut builder = RegistryBuilder::new();
    for (job, deps) in edges {
        let task = format!("t_{job}");
        builder = builder
            .task(&task, "true", &[], &[])
            .job(job, &[task.as_str()], deps);
    }
    builder.graph()
}
