// src/staging/mod.rs

//! File staging.
//!
//! The [`StagingCoordinator`] makes sure every file a task refers to is in
//! place on the agent before the task's command runs. It only does the
//! bookkeeping (what has been staged, and whether it had to be made
//! executable); moving bytes is delegated to a [`Transfer`] implementation.
//!
//! - [`local`] provides [`LocalTransfer`], which copies files between two
//!   directories through the [`FileSystem`](crate::fs::FileSystem) trait.

pub mod local;

pub use local::LocalTransfer;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::errors::{PermissionError, StagingError, TransferError};
use crate::registry::FileSpec;
use crate::types::FileName;

/// Moves a declared file to its agent path.
///
/// Implementations are synchronous; the executor calls the coordinator from
/// Tokio's blocking pool.
pub trait Transfer: Send + Sync {
    fn stage(&self, file: &FileSpec) -> Result<(), TransferError>;
    fn set_executable(&self, file: &FileSpec) -> Result<(), PermissionError>;
}

impl<T: Transfer + ?Sized> Transfer for Arc<T> {
    fn stage(&self, file: &FileSpec) -> Result<(), TransferError> {
        (**self).stage(file)
    }

    fn set_executable(&self, file: &FileSpec) -> Result<(), PermissionError> {
        (**self).set_executable(file)
    }
}

/// Bookkeeping entry for a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedFile {
    pub executable: bool,
}

/// Tracks which files are staged and stages the rest on demand.
///
/// Staging is idempotent: once a file is staged, later calls return `Ok`
/// without touching the transfer collaborator. Each file has its own lock,
/// so concurrent requests for the same file produce a single transfer while
/// different files stage in parallel.
pub struct StagingCoordinator<T: Transfer> {
    transfer: T,
    slots: Mutex<HashMap<FileName, Arc<Mutex<Option<StagedFile>>>>>,
}

impl<T: Transfer> std::fmt::Debug for StagingCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingCoordinator")
            .field("staged", &self.staged_files())
            .finish_non_exhaustive()
    }
}

impl<T: Transfer> StagingCoordinator<T> {
    pub fn new(transfer: T) -> Self {
        Self {
            transfer,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Stage `file` unless it already is.
    ///
    /// For executable files the execute bit is set after the transfer; the
    /// file only counts as staged once both steps succeeded, so a failed
    /// attempt is retried by the next caller.
    pub fn ensure_staged(&self, file: &FileSpec) -> Result<(), StagingError> {
        let slot = self.slot(&file.name);
        let mut staged = lock(&slot);

        if staged.is_some() {
            debug!(file = %file.name, "file already staged");
            return Ok(());
        }

        info!(
            file = %file.name,
            local = %file.local_path,
            agent = %file.agent_path,
            "staging file"
        );

        self.transfer.stage(file).inspect_err(|e| {
            warn!(file = %file.name, error = %e, "file transfer failed");
        })?;

        if file.executable {
            self.transfer.set_executable(file).inspect_err(|e| {
                warn!(file = %file.name, error = %e, "could not mark file executable");
            })?;
        }

        *staged = Some(StagedFile {
            executable: file.executable,
        });
        Ok(())
    }

    /// Stage every file in order, stopping at the first failure.
    pub fn ensure_all_staged(&self, files: &[FileSpec]) -> Result<(), StagingError> {
        for file in files {
            self.ensure_staged(file)?;
        }
        Ok(())
    }

    pub fn is_staged(&self, name: &str) -> bool {
        let slots = lock(&self.slots);
        slots
            .get(name)
            .map(|slot| lock(slot).is_some())
            .unwrap_or(false)
    }

    /// Every staged file with its executability, in name order.
    pub fn staged_files(&self) -> BTreeMap<FileName, StagedFile> {
        let slots = lock(&self.slots);
        slots
            .iter()
            .filter_map(|(name, slot)| lock(slot).map(|s| (name.clone(), s)))
            .collect()
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    fn slot(&self, name: &str) -> Arc<Mutex<Option<StagedFile>>> {
        let mut slots = lock(&self.slots);
        Arc::clone(slots.entry(name.to_string()).or_default())
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    // Bookkeeping stays consistent even if a holder panicked: a slot is only
    // filled after a complete, successful staging.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
