use std::fmt;

use serde::Deserialize;

/// Canonical name types used throughout the crate.
pub type FileName = String;
pub type TaskName = String;
pub type JobName = String;

/// The three declaration namespaces.
///
/// Files, tasks and jobs are kept apart: a task called `bc` and a job called
/// `bc` do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    File,
    Task,
    Job,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::File => "file",
            EntityKind::Task => "task",
            EntityKind::Job => "job",
        };
        f.write_str(s)
    }
}

/// Opaque correlation key attached to a job.
///
/// Derived from the name of another job plus a data file, e.g.
/// `JobId::derive("job1", "bc_map.csv")`. It is carried through to reports
/// but never consulted when deciding what runs next, and the referenced job
/// does not have to exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct JobId {
    pub job: JobName,
    pub data_file: FileName,
}

impl JobId {
    pub fn derive(job: impl Into<JobName>, data_file: impl Into<FileName>) -> Self {
        Self {
            job: job.into(),
            data_file: data_file.into(),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.job, self.data_file)
    }
}
