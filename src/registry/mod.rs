// src/registry/mod.rs

//! Entity registry.
//!
//! Declarations are collected into a mutable [`Registry`]. Name uniqueness is
//! enforced at declaration time; cross references (task → file, job → task,
//! job → job) are only checked by [`Registry::finalize`], so jobs may name
//! dependencies that are declared later. A successful finalize yields the
//! immutable [`Catalog`] that the rest of the crate works from.

pub mod model;
pub mod ordered_set;

pub use model::{FileSpec, JobSpec, TaskSpec};
pub use ordered_set::OrderedSet;

use std::collections::BTreeMap;

use tracing::debug;

use crate::errors::{JobdagError, Result};
use crate::types::{EntityKind, FileName, JobName, TaskName};

/// Mutable declaration context.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    files: BTreeMap<FileName, FileSpec>,
    tasks: BTreeMap<TaskName, TaskSpec>,
    jobs: BTreeMap<JobName, JobSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_file(&mut self, file: FileSpec) -> Result<()> {
        if self.files.contains_key(&file.name) {
            return Err(duplicate(EntityKind::File, &file.name));
        }
        debug!(file = %file.name, "declared file");
        self.files.insert(file.name.clone(), file);
        Ok(())
    }

    pub fn declare_task(&mut self, task: TaskSpec) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(duplicate(EntityKind::Task, &task.name));
        }
        debug!(task = %task.name, "declared task");
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn declare_job(&mut self, job: JobSpec) -> Result<()> {
        if self.jobs.contains_key(&job.name) {
            return Err(duplicate(EntityKind::Job, &job.name));
        }
        debug!(job = %job.name, "declared job");
        self.jobs.insert(job.name.clone(), job);
        Ok(())
    }

    /// Mutable access to an already-declared job.
    ///
    /// Used by config generators that append tasks to a job.
    pub fn job_mut(&mut self, name: &str) -> Option<&mut JobSpec> {
        self.jobs.get_mut(name)
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        match kind {
            EntityKind::File => self.files.contains_key(name),
            EntityKind::Task => self.tasks.contains_key(name),
            EntityKind::Job => self.jobs.contains_key(name),
        }
    }

    /// Validate every cross reference and freeze the declarations.
    ///
    /// Checks run in a fixed order (task files, job tasks, job dependencies;
    /// owners by name) so the reported error is deterministic.
    pub fn finalize(self) -> Result<Catalog> {
        for task in self.tasks.values() {
            for file in &task.refers_to {
                if !self.files.contains_key(file) {
                    return Err(unresolved(EntityKind::Task, &task.name, EntityKind::File, file));
                }
            }
        }

        for job in self.jobs.values() {
            for task in &job.tasks {
                if !self.tasks.contains_key(task) {
                    return Err(unresolved(EntityKind::Job, &job.name, EntityKind::Task, task));
                }
            }
        }

        for job in self.jobs.values() {
            for dep in &job.depends_on_jobs {
                if !self.jobs.contains_key(dep) {
                    return Err(unresolved(EntityKind::Job, &job.name, EntityKind::Job, dep));
                }
                if dep == &job.name {
                    return Err(JobdagError::CyclicDependency {
                        cycle: vec![job.name.clone()],
                    });
                }
            }
        }

        debug!(
            files = self.files.len(),
            tasks = self.tasks.len(),
            jobs = self.jobs.len(),
            "registry finalized"
        );

        Ok(Catalog {
            files: self.files,
            tasks: self.tasks,
            jobs: self.jobs,
        })
    }
}

fn duplicate(kind: EntityKind, name: &str) -> JobdagError {
    JobdagError::DuplicateName {
        kind,
        name: name.to_string(),
    }
}

fn unresolved(owner_kind: EntityKind, owner: &str, kind: EntityKind, name: &str) -> JobdagError {
    JobdagError::UnresolvedReference {
        owner_kind,
        owner: owner.to_string(),
        kind,
        name: name.to_string(),
    }
}

/// Finalized, immutable set of declarations with all references resolved.
#[derive(Debug, Clone)]
pub struct Catalog {
    files: BTreeMap<FileName, FileSpec>,
    tasks: BTreeMap<TaskName, TaskSpec>,
    jobs: BTreeMap<JobName, JobSpec>,
}

impl Catalog {
    pub fn file(&self, name: &str) -> Option<&FileSpec> {
        self.files.get(name)
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    pub fn job(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.get(name)
    }

    /// Jobs in name order.
    pub fn jobs(&self) -> impl Iterator<Item = &JobSpec> {
        self.jobs.values()
    }

    /// Resolve the files a task refers to, in declared order.
    ///
    /// References were validated by `finalize`, so every name resolves.
    pub fn files_of(&self, task: &TaskSpec) -> Vec<FileSpec> {
        task.refers_to
            .iter()
            .filter_map(|name| self.files.get(name).cloned())
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}
