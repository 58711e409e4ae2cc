//! External bulk-transfer invocation
//!
//! The actual plot copy is delegated to an external high-throughput
//! tool (netcat-based in the reference deployment). Its exit status is
//! advisory only: final correctness is decided by size verification,
//! never by the tool's own return code.

use crate::error::{PlotMoverError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Seam for the bulk-copy mechanism
pub trait PlotTransport {
    /// Send the plot at `source` to the destination, blocking until
    /// the attempt finishes.
    fn send(&self, source: &Path, file_name: &str) -> Result<()>;
}

/// Transport that runs the configured external tool as
/// `tool <source_path> <file_name>` and waits for it, enforcing an
/// optional deadline.
pub struct ToolTransport {
    tool: PathBuf,
    timeout: Option<Duration>,
}

impl ToolTransport {
    /// Create a transport around `tool`. A `timeout` of `None` waits
    /// forever, which can wedge a timer-driven deployment; configure a
    /// deadline for unattended use.
    pub fn new(tool: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            tool: tool.into(),
            timeout,
        }
    }
}

impl PlotTransport for ToolTransport {
    fn send(&self, source: &Path, file_name: &str) -> Result<()> {
        tracing::info!("Invoking {:?} for {}", self.tool, file_name);
        let started = Instant::now();

        let mut child = Command::new(&self.tool)
            .arg(source)
            .arg(file_name)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| PlotMoverError::TransferSpawn {
                tool: self.tool.clone(),
                message: e.to_string(),
            })?;

        let deadline = self.timeout.map(|t| started + t);
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    // Advisory only; verification decides correctness.
                    if status.success() {
                        tracing::debug!("Transfer tool exited cleanly");
                    } else {
                        tracing::warn!("Transfer tool exited with {}, relying on verification", status);
                    }
                    return Ok(());
                }
                Ok(None) => {}
                Err(e) => return Err(PlotMoverError::io(source, e)),
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::warn!("Transfer of {} timed out, killing the tool", file_name);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(PlotMoverError::TransferTimeout {
                        path: source.to_path_buf(),
                        limit_secs: self.timeout.map(|t| t.as_secs()).unwrap_or(0),
                    });
                }
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
