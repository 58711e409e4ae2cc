//! # PlotMover - Plot Transfer Coordination
//!
//! PlotMover coordinates the one-at-a-time transfer of large,
//! immutable plot files from a plotting host to a NAS over a
//! dedicated high-bandwidth link. The bulk copy itself is delegated
//! to an external tool; this crate is the control plane that decides
//! whether, when, and how safely a transfer proceeds.
//!
//! ## How it works
//!
//! - **Discovery**: the plot directory is scanned for a finished plot
//!   (extension match plus a minimum-size sanity filter).
//! - **Locking**: a local sentinel file gives at-most-one-transfer-in-
//!   flight semantics across repeated timer-driven invocations; a
//!   mirrored sentinel on the NAS is kept advisory.
//! - **Transfer**: the external tool is invoked synchronously with an
//!   enforced deadline; its exit status is advisory only.
//! - **Verification**: source and destination file sizes are compared
//!   over SSH. Match commits the job (source deleted); mismatch rolls
//!   it back (source retained for a later attempt).
//!
//! ## Quick Start
//!
//! ```no_run
//! use plotmover::config::Config;
//! use plotmover::core::{ToolTransport, TransferCoordinator};
//! use plotmover::remote::SshExecutor;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! let config = Config::load(Path::new("/etc/plotmover/config.json")).unwrap();
//! let remote = SshExecutor::new(config.remote.clone());
//! let transport = ToolTransport::new(&config.transfer_tool, Some(Duration::from_secs(3600)));
//!
//! let mut coordinator = TransferCoordinator::new(&config, &remote, &transport);
//! let outcome = coordinator.run_once().unwrap();
//! println!("{:?}", outcome);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod lock;
pub mod plots;
pub mod remote;
pub mod verify;

// Re-export commonly used types
pub use config::Config;
pub use core::{JobState, RunOutcome, TransferCoordinator};
pub use error::{PlotMoverError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use plotmover::prelude::*;
    //! ```

    pub use crate::config::{CliArgs, Config, RemoteConfig};
    pub use crate::core::{
        JobState, PlotTransport, RollbackReason, RunOutcome, ToolTransport, TransferCoordinator,
    };
    pub use crate::error::{PlotMoverError, Result};
    pub use crate::lock::JobLock;
    pub use crate::plots::{PlotCandidate, PlotSource};
    pub use crate::remote::{RemoteExecutor, SshExecutor};
    pub use crate::verify::{verify_sizes, SizeRecord};
}
