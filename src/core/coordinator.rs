//! Transfer job state machine
//!
//! One coordination pass per invocation: discover a candidate, take
//! the cross-host lock, resolve the destination mount, delegate the
//! bulk copy, verify sizes, then commit (delete the source) or roll
//! back (retain the source). The coordinator is meant to be run
//! repeatedly from a timer; a pass that finds no candidate or an
//! already-held lock is a fast no-op, which is how the system gets
//! at-most-one-transfer-in-flight without any in-process concurrency
//! primitives.

use crate::config::Config;
use crate::core::PlotTransport;
use crate::error::{IoResultExt, PlotMoverError, Result};
use crate::lock::JobLock;
use crate::plots::{PlotCandidate, PlotSource};
use crate::remote::RemoteExecutor;
use crate::verify::{verify_sizes, SizeRecord};
use std::time::{Duration, Instant};

/// Where a job currently sits in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// No job in flight
    Idle,
    /// Lock taken, destination not yet resolved
    Locked,
    /// Bulk copy running
    Transferring,
    /// Size comparison in progress
    Verifying,
    /// Transfer verified, source deleted
    Committed,
    /// Transfer rejected, source retained
    RolledBack,
}

/// Why a run ended in rollback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackReason {
    /// Local and remote sizes disagree
    SizeMismatch(SizeRecord),
    /// The transfer tool ran past its deadline and was killed
    Timeout,
}

/// Result of one coordination pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No eligible plot in the source directory
    NoCandidate,
    /// A transfer is already in flight (lock held)
    AlreadyRunning,
    /// Dry-run mode; a candidate was found but nothing was done
    DryRun {
        /// Plot that would have been moved
        file_name: String,
    },
    /// Transfer verified; source removed
    Committed {
        /// Plot that was moved
        file_name: String,
        /// Verified size in bytes
        size: u64,
    },
    /// Transfer rejected; source retained for a later retry
    RolledBack {
        /// Plot that failed to move
        file_name: String,
        /// What went wrong
        reason: RollbackReason,
    },
}

/// Drives the end-to-end transfer job life cycle
pub struct TransferCoordinator<'a> {
    config: &'a Config,
    remote: &'a dyn RemoteExecutor,
    transport: &'a dyn PlotTransport,
    lock: JobLock,
    state: JobState,
}

impl<'a> TransferCoordinator<'a> {
    /// Create a coordinator over the given collaborators
    pub fn new(
        config: &'a Config,
        remote: &'a dyn RemoteExecutor,
        transport: &'a dyn PlotTransport,
    ) -> Self {
        let lock = JobLock::new(&config.lock_file, config.remote_lock_file.clone());
        Self {
            config,
            remote,
            transport,
            lock,
            state: JobState::Idle,
        }
    }

    /// State reached by the most recent pass
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Perform at most one full job attempt.
    ///
    /// The lock file on disk, not process memory, is the admission
    /// gate: if it exists the pass returns immediately without any
    /// remote activity. Fatal remote failures (mount resolution, size
    /// query) release the lock before propagating so a later pass is
    /// not permanently blocked.
    pub fn run_once(&mut self) -> Result<RunOutcome> {
        self.state = JobState::Idle;

        if self.lock.is_held() {
            tracing::debug!("Lock file exists, a transfer is already running");
            return Ok(RunOutcome::AlreadyRunning);
        }

        let source = PlotSource::new(
            &self.config.plot_dir,
            self.config.plot_extension.clone(),
            self.config.min_plot_size,
        );
        let Some(candidate) = source.discover()? else {
            return Ok(RunOutcome::NoCandidate);
        };

        if self.config.dry_run {
            tracing::info!("Dry run: would move {}", candidate.file_name);
            return Ok(RunOutcome::DryRun {
                file_name: candidate.file_name,
            });
        }

        if !self.lock.try_acquire(self.remote)? {
            // Lost the race against another invocation. Normal.
            return Ok(RunOutcome::AlreadyRunning);
        }
        self.state = JobState::Locked;
        tracing::info!("Processing plot: {:?}", candidate.path);

        let remote_mount = match self.resolve_mount() {
            Ok(mount) => mount,
            Err(e) => {
                // Cannot transfer to an unknown location; unwind the
                // lock so the next pass is not blocked forever.
                self.release_lock_best_effort();
                return Err(e);
            }
        };
        tracing::debug!(
            "{} reports remote mount as {}",
            self.config.remote.host,
            remote_mount
        );

        self.state = JobState::Transferring;
        let started = Instant::now();
        match self.transport.send(&candidate.path, &candidate.file_name) {
            Ok(()) => {}
            Err(PlotMoverError::TransferTimeout { limit_secs, .. }) => {
                self.cleanup_receivers();
                self.release_lock_best_effort();
                self.state = JobState::RolledBack;
                tracing::warn!(
                    "Transfer of {} hit the {}s deadline; source retained for retry",
                    candidate.file_name,
                    limit_secs
                );
                return Ok(RunOutcome::RolledBack {
                    file_name: candidate.file_name,
                    reason: RollbackReason::Timeout,
                });
            }
            Err(e) => {
                self.cleanup_receivers();
                self.release_lock_best_effort();
                return Err(e);
            }
        }
        let elapsed = Duration::from_secs(started.elapsed().as_secs());
        tracing::info!(
            "Transfer tool finished after {}",
            humantime::format_duration(elapsed)
        );

        // Stale receivers on the NAS would hold the destination file
        // open; kill them before measuring it.
        self.cleanup_receivers();

        self.state = JobState::Verifying;
        let sizes = match verify_sizes(
            self.remote,
            &remote_mount,
            &candidate.path,
            &candidate.file_name,
        ) {
            Ok(sizes) => sizes,
            Err(e) => {
                self.release_lock_best_effort();
                return Err(e);
            }
        };

        if sizes.matches() {
            self.commit(&candidate, sizes)
        } else {
            tracing::warn!(
                "Plot size mismatch for {}: local {}, remote {}",
                candidate.file_name,
                sizes.local,
                sizes.remote
            );
            self.release_lock_best_effort();
            self.state = JobState::RolledBack;
            Ok(RunOutcome::RolledBack {
                file_name: candidate.file_name,
                reason: RollbackReason::SizeMismatch(sizes),
            })
        }
    }

    fn commit(&mut self, candidate: &PlotCandidate, sizes: SizeRecord) -> Result<RunOutcome> {
        tracing::info!(
            "Plot sizes match, we have a good plot move: {} ({})",
            candidate.file_name,
            humansize::format_size(sizes.local, humansize::BINARY)
        );

        self.notify_received();
        self.lock.release(self.remote)?;

        std::fs::remove_file(&candidate.path).with_path(&candidate.path)?;
        tracing::info!("Removed {:?}", candidate.path);

        self.state = JobState::Committed;
        Ok(RunOutcome::Committed {
            file_name: candidate.file_name.clone(),
            size: sizes.local,
        })
    }

    fn resolve_mount(&self) -> Result<String> {
        let command = self.config.mount_lookup_command();
        let output = self
            .remote
            .run(&command)
            .map_err(|e| PlotMoverError::MountResolution(e.to_string()))?;
        let mount = output.trim().to_string();
        if mount.is_empty() {
            return Err(PlotMoverError::MountResolution(format!(
                "`{}` returned no output",
                command
            )));
        }
        Ok(mount)
    }

    fn release_lock_best_effort(&self) {
        if let Err(e) = self.lock.release(self.remote) {
            tracing::warn!("Could not release transfer lock: {}", e);
        }
    }

    fn cleanup_receivers(&self) {
        let Some(command) = &self.config.remote_cleanup_command else {
            return;
        };
        match self.remote.run(command) {
            Ok(_) => tracing::debug!("Remote receiver cleanup called"),
            Err(e) => tracing::warn!("Remote receiver cleanup failed: {}", e),
        }
    }

    fn notify_received(&self) {
        let Some(notify_file) = &self.config.remote_notify_file else {
            return;
        };
        if let Err(e) = self.remote.run(&format!("touch {}", notify_file)) {
            tracing::warn!("New-plot notification failed: {}", e);
        }
    }
}
