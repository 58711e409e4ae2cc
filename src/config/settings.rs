//! Configuration settings for PlotMover
//!
//! Defines all configuration options, CLI arguments, and defaults
//! for the transfer coordinator.

use crate::error::{IoResultExt, PlotMoverError, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default minimum plot size in bytes, based on the K32 plot format.
/// Anything smaller is assumed to still be written by the plotter.
pub const DEFAULT_MIN_PLOT_SIZE: u64 = 108_644_374_730;

/// PlotMover - coordinates moving finished plots to NAS storage
#[derive(Parser, Debug, Clone)]
#[command(name = "plotmover")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Moves finished plots from a plotter to NAS storage, one at a time")]
#[command(long_about = r#"
PlotMover coordinates the one-at-a-time transfer of finished plot files
from this host to a NAS over a dedicated high-bandwidth link. The bulk
copy itself is delegated to an external transfer tool; PlotMover decides
whether a transfer may start, holds a cross-host lock while one is in
flight, and verifies the result by comparing file sizes over SSH.

It is designed to run unattended from a timer (cron/systemd). Each
invocation performs at most one transfer attempt; if no plot is ready
or a transfer is already running, the invocation is a fast no-op.

Examples:
  plotmover --config /etc/plotmover/config.json        # One pass
  plotmover --config config.json --dry-run             # Report only
  plotmover --config config.json status                # Lock + queue state
  plotmover --config config.json unlock                # Clear a stale lock
"#)]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long, default_value = "/etc/plotmover/config.json", value_name = "PATH")]
    pub config: PathBuf,

    /// Report what would be done without locking or transferring
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Optional subcommand; without one, a single coordination pass runs
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show lock state and the next pending plot, then exit
    Status,
    /// Force-release the local transfer lock after manual intervention
    Unlock,
}

/// Connection settings for the NAS host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Hostname or address of the NAS (e.g. the internal 10GbE alias)
    pub host: String,
    /// SSH user
    pub user: String,
    /// SSH port
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// SSH private key path; when absent the SSH agent is tried
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

fn default_ssh_port() -> u16 {
    22
}

/// Runtime configuration for the transfer coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for finished plots
    pub plot_dir: PathBuf,

    /// File extension that marks a plot (without the dot)
    #[serde(default = "default_plot_extension")]
    pub plot_extension: String,

    /// Minimum size in bytes for a plot to be considered finished
    #[serde(default = "default_min_plot_size")]
    pub min_plot_size: u64,

    /// Local sentinel file; its existence means a transfer is in flight
    pub lock_file: PathBuf,

    /// Mirrored sentinel path on the NAS; advisory only
    pub remote_lock_file: String,

    /// NAS connection settings
    pub remote: RemoteConfig,

    /// Path of the NAS-side config file the mount path is read from
    pub remote_config_path: String,

    /// Key greped out of the NAS config to find the destination mount
    #[serde(default = "default_mount_config_key")]
    pub mount_config_key: String,

    /// External tool invoked as `tool <source_path> <file_name>`
    pub transfer_tool: PathBuf,

    /// Optional NAS-side command that kills stale receiver processes
    #[serde(default)]
    pub remote_cleanup_command: Option<String>,

    /// Optional NAS-side file touched to announce a newly received plot
    #[serde(default)]
    pub remote_notify_file: Option<String>,

    /// Transfer timeout in seconds; 0 disables the deadline
    #[serde(default = "default_transfer_timeout_secs")]
    pub transfer_timeout_secs: u64,

    /// Report-only mode; no lock, no transfer, no remote calls
    #[serde(default)]
    pub dry_run: bool,
}

fn default_plot_extension() -> String {
    "plot".to_string()
}

fn default_min_plot_size() -> u64 {
    DEFAULT_MIN_PLOT_SIZE
}

fn default_mount_config_key() -> String {
    "enclosure".to_string()
}

fn default_transfer_timeout_secs() -> u64 {
    6 * 3600
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).with_path(path)?;
        let config: Config = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration and apply CLI overrides
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(&args.config)?;
        if args.dry_run {
            config.dry_run = true;
        }
        Ok(config)
    }

    /// Basic sanity checks on loaded values
    pub fn validate(&self) -> Result<()> {
        if self.plot_extension.is_empty() {
            return Err(PlotMoverError::config("plot_extension must not be empty"));
        }
        if self.remote.host.is_empty() {
            return Err(PlotMoverError::config("remote.host must not be empty"));
        }
        if self.remote_config_path.is_empty() {
            return Err(PlotMoverError::config(
                "remote_config_path must not be empty",
            ));
        }
        Ok(())
    }

    /// Command run on the NAS to extract the destination mount path
    /// from its own configuration file.
    pub fn mount_lookup_command(&self) -> String {
        format!(
            "grep {} {} | awk '{{print $3}}'",
            self.mount_config_key, self.remote_config_path
        )
    }
}
