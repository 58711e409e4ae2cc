//! Cross-host transfer lock
//!
//! At-most-one-transfer-in-flight is enforced by a local sentinel
//! file whose existence, independent of process memory, gates
//! admission of new jobs. Because the coordinator runs from a timer
//! rather than as a long-lived process, the file system is the
//! persistence layer for the lock by design.
//!
//! A mirrored sentinel is kept on the NAS for future destination-side
//! coordination. It is advisory only: failures to create or remove it
//! are logged and never change the outcome of a local acquire or
//! release, so it can drift out of sync with the local flag.

use crate::error::{IoResultExt, Result};
use crate::remote::RemoteExecutor;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// The two sentinel files that make up the transfer lock
#[derive(Debug, Clone)]
pub struct JobLock {
    local_flag: PathBuf,
    remote_flag: String,
}

impl JobLock {
    /// Create a lock over the given sentinel paths
    pub fn new(local_flag: impl Into<PathBuf>, remote_flag: impl Into<String>) -> Self {
        Self {
            local_flag: local_flag.into(),
            remote_flag: remote_flag.into(),
        }
    }

    /// Whether a transfer is currently in flight. This is the single
    /// admission-control gate checked before starting any new job.
    pub fn is_held(&self) -> bool {
        self.local_flag.exists()
    }

    /// Path of the local sentinel file
    pub fn local_flag(&self) -> &Path {
        &self.local_flag
    }

    /// Try to take the lock. Returns `Ok(false)` without mutating
    /// anything if the local flag already exists.
    ///
    /// The local flag is created with create-new semantics so a
    /// concurrent invocation cannot silently clobber it. The remote
    /// mirror is then created best-effort; a failure there leaves the
    /// local lock held and is only logged.
    pub fn try_acquire(&self, remote: &dyn RemoteExecutor) -> Result<bool> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.local_flag)
        {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!("Lock file {:?} already exists", self.local_flag);
                return Ok(false);
            }
            Err(e) => return Err(crate::error::PlotMoverError::io(&self.local_flag, e)),
        }

        if let Err(e) = remote.run(&format!("touch {}", self.remote_flag)) {
            tracing::warn!("Could not create remote lock flag: {}", e);
        }

        Ok(true)
    }

    /// Release the lock. A second call in a row is a no-op.
    ///
    /// The remote mirror is removed best-effort, and only when the
    /// local flag actually existed.
    pub fn release(&self, remote: &dyn RemoteExecutor) -> Result<()> {
        if !self.local_flag.exists() {
            tracing::debug!("Lock file {:?} does not exist, nothing to release", self.local_flag);
            return Ok(());
        }

        std::fs::remove_file(&self.local_flag).with_path(&self.local_flag)?;

        if let Err(e) = remote.run(&format!("rm -f {}", self.remote_flag)) {
            tracing::warn!("Could not remove remote lock flag: {}", e);
        }

        Ok(())
    }
}
