//! Exclusive lock on a state directory.
//!
//! Two sweeps sharing a state directory would overwrite each other's
//! fingerprints, so a run holds an OS file lock on
//! `{state_dir}/.locks/sweep-state.lock` from load to save. The lock is
//! released when the [`StateLock`] is dropped.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::constants::STATE_LOCK_NAME;

/// A held lock on a state directory.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Waits for and takes the lock of `state_dir`, creating the lock file
    /// if needed.
    ///
    /// The wait happens on a blocking thread so the runtime keeps running.
    /// There is no timeout.
    pub async fn acquire(state_dir: &Path) -> Result<Self> {
        let locks_dir = state_dir.join(".locks");
        tokio::fs::create_dir_all(&locks_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                anyhow::anyhow!(
                    "Permission denied: cannot create locks directory at {}",
                    locks_dir.display()
                )
            } else {
                anyhow::anyhow!("Failed to create directory {}: {}", locks_dir.display(), e)
            }
        })?;

        let path = locks_dir.join(format!("{STATE_LOCK_NAME}.lock"));
        let lock_path = path.clone();
        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path)
                .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

            file.lock_exclusive()
                .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        tracing::debug!(target: "state", "Locked {}", path.display());
        Ok(Self {
            file,
            path,
        })
    }

    /// Takes the lock only if nobody holds it. `Ok(None)` when it is taken.
    pub fn try_acquire(state_dir: &Path) -> Result<Option<Self>> {
        let locks_dir = state_dir.join(".locks");
        std::fs::create_dir_all(&locks_dir)
            .with_context(|| format!("Failed to create directory {}", locks_dir.display()))?;

        let path = locks_dir.join(format!("{STATE_LOCK_NAME}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file: {}", path.display()))?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(true) => Ok(Some(Self {
                file,
                path,
            })),
            Ok(false) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to lock {}", path.display())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(target: "state", "Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
