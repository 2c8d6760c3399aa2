#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use jobdag::errors::{PermissionError, TransferError};
use jobdag::registry::FileSpec;
use jobdag::staging::Transfer;

/// A fake [`Transfer`] that:
/// - counts stage and set-executable calls per file name
/// - optionally blocks for a while inside `stage`, to widen race windows
/// - fails for the files it was told to fail.
#[derive(Default)]
pub struct FakeTransfer {
    delay: Duration,
    staged: Mutex<HashMap<String, usize>>,
    chmods: Mutex<HashMap<String, usize>>,
    failing_transfer: Mutex<HashSet<String>>,
    failing_permission: Mutex<HashSet<String>>,
}

impl FakeTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn fail_transfer(&self, file: &str) {
        self.failing_transfer.lock().unwrap().insert(file.to_string());
    }

    pub fn fail_permission(&self, file: &str) {
        self.failing_permission.lock().unwrap().insert(file.to_string());
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        self.failing_transfer.lock().unwrap().clear();
        self.failing_permission.lock().unwrap().clear();
    }

    pub fn transfers(&self, file: &str) -> usize {
        self.staged.lock().unwrap().get(file).copied().unwrap_or(0)
    }

    pub fn total_transfers(&self) -> usize {
        self.staged.lock().unwrap().values().sum()
    }

    pub fn permission_changes(&self, file: &str) -> usize {
        self.chmods.lock().unwrap().get(file).copied().unwrap_or(0)
    }
}

impl Transfer for FakeTransfer {
    fn stage(&self, file: &FileSpec) -> Result<(), TransferError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        *self
            .staged
            .lock()
            .unwrap()
            .entry(file.name.clone())
            .or_insert(0) += 1;

        if self.failing_transfer.lock().unwrap().contains(&file.name) {
            return Err(TransferError {
                file: file.name.clone(),
                reason: "scripted transfer failure".to_string(),
            });
        }
        Ok(())
    }

    fn set_executable(&self, file: &FileSpec) -> Result<(), PermissionError> {
        *self
            .chmods
            .lock()
            .unwrap()
            .entry(file.name.clone())
            .or_insert(0) += 1;

        if self.failing_permission.lock().unwrap().contains(&file.name) {
            return Err(PermissionError {
                file: file.name.clone(),
                reason: "scripted permission failure".to_string(),
            });
        }
        Ok(())
    }
}
