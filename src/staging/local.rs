// src/staging/local.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{PermissionError, TransferError};
use crate::fs::FileSystem;
use crate::registry::FileSpec;

use super::Transfer;

/// Transfer that copies files from a local directory into an agent directory
/// on the same machine.
///
/// `local_path` is resolved against `local_root` and `agent_path` against
/// `agent_root`. When the destination already holds identical content
/// (compared by blake3 digest) the write is skipped.
#[derive(Debug, Clone)]
pub struct LocalTransfer<F: FileSystem> {
    fs: F,
    local_root: PathBuf,
    agent_root: PathBuf,
}

impl<F: FileSystem> LocalTransfer<F> {
    pub fn new(fs: F, local_root: impl Into<PathBuf>, agent_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            local_root: local_root.into(),
            agent_root: agent_root.into(),
        }
    }

    pub fn local_path_of(&self, file: &FileSpec) -> PathBuf {
        self.local_root.join(&file.local_path)
    }

    pub fn agent_path_of(&self, file: &FileSpec) -> PathBuf {
        self.agent_root.join(&file.agent_path)
    }

    /// Create the agent directory. Commands run from it even when no file
    /// has been staged there yet.
    pub fn prepare_agent_root(&self) -> anyhow::Result<()> {
        self.fs.create_dir_all(&self.agent_root)?;
        debug!(agent_root = ?self.agent_root, "agent directory ready");
        Ok(())
    }

    fn same_content(&self, dest: &Path, contents: &[u8]) -> bool {
        if !self.fs.is_file(dest) {
            return false;
        }
        match self.fs.read(dest) {
            Ok(existing) => blake3::hash(&existing) == blake3::hash(contents),
            Err(_) => false,
        }
    }
}

impl<F: FileSystem> Transfer for LocalTransfer<F> {
    fn stage(&self, file: &FileSpec) -> Result<(), TransferError> {
        let src = self.local_path_of(file);
        let dest = self.agent_path_of(file);

        let contents = self.fs.read(&src).map_err(|e| TransferError {
            file: file.name.clone(),
            reason: format!("{e:#}"),
        })?;

        if self.same_content(&dest, &contents) {
            debug!(file = %file.name, dest = ?dest, "agent copy up to date; skipping write");
            return Ok(());
        }

        self.fs.write(&dest, &contents).map_err(|e| TransferError {
            file: file.name.clone(),
            reason: format!("{e:#}"),
        })?;

        debug!(file = %file.name, src = ?src, dest = ?dest, bytes = contents.len(), "copied file");
        Ok(())
    }

    fn set_executable(&self, file: &FileSpec) -> Result<(), PermissionError> {
        let dest = self.agent_path_of(file);
        self.fs.set_executable(&dest).map_err(|e| PermissionError {
            file: file.name.clone(),
            reason: format!("{e:#}"),
        })
    }
}
