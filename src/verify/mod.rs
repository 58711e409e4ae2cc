//! Transfer verification
//!
//! Decides whether a completed transfer is good by comparing the
//! local plot size with the size reported by the NAS. Size equality
//! is the sole correctness signal; there is no checksum. That is a
//! deliberate speed-over-certainty trade-off that only holds because
//! plots are immutable and size-stable once fully written.

use crate::error::{IoResultExt, PlotMoverError, Result};
use crate::remote::RemoteExecutor;
use std::path::Path;

/// Local/remote size pair for one verified plot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRecord {
    /// Size of the source file on the plotter
    pub local: u64,
    /// Size the NAS reports for the received copy
    pub remote: u64,
}

impl SizeRecord {
    /// Whether the transfer is considered good
    pub fn matches(&self) -> bool {
        self.local == self.remote
    }
}

/// Compare source and destination sizes for a transferred plot.
///
/// The remote size is queried over the remote-exec channel; the local
/// size comes straight from the filesystem. Any failure to obtain or
/// parse the remote size is an error, not a mismatch: without a
/// remote size there is no safe decision, and the caller must treat
/// the run as failed. No retries happen here.
pub fn verify_sizes(
    remote: &dyn RemoteExecutor,
    remote_mount: &str,
    source_path: &Path,
    file_name: &str,
) -> Result<SizeRecord> {
    let remote_path = format!("{}/{}", remote_mount.trim_end_matches('/'), file_name);
    tracing::debug!("Verifying {}", remote_path);

    let command = format!("stat -c %s {}", remote_path);
    let output = remote.run(&command)?;
    let remote_size: u64 = output
        .trim()
        .parse()
        .map_err(|_| PlotMoverError::SizeQuery {
            path: remote_path.clone(),
            output: output.trim().to_string(),
        })?;
    tracing::debug!("Remote plot size reported as {}", remote_size);

    let local_size = std::fs::metadata(source_path)
        .with_path(source_path)?
        .len();
    tracing::debug!("Local plot size reported as {}", local_size);

    Ok(SizeRecord {
        local: local_size,
        remote: remote_size,
    })
}
