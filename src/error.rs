//! Error types for PlotMover
//!
//! This module defines all error types used throughout the application,
//! providing detailed error information for debugging and log output.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for PlotMover operations
#[derive(Error, Debug)]
pub enum PlotMoverError {
    /// I/O error during local file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Network/SSH connection error
    #[error("Connection error to '{host}': {message}")]
    ConnectionError { host: String, message: String },

    /// SSH authentication failed
    #[error("SSH authentication failed for '{user}@{host}': {message}")]
    AuthenticationError {
        user: String,
        host: String,
        message: String,
    },

    /// A remote command exited non-zero or could not be executed
    #[error("Remote command `{command}` failed: {message}")]
    RemoteCommandError { command: String, message: String },

    /// The destination mount path could not be resolved
    #[error("Could not resolve destination mount: {0}")]
    MountResolution(String),

    /// The remote size query returned output that is not a size
    #[error("Remote size query for '{path}' returned unusable output: {output:?}")]
    SizeQuery { path: String, output: String },

    /// The external transfer tool could not be started
    #[error("Transfer tool '{tool}' failed to start: {message}")]
    TransferSpawn { tool: PathBuf, message: String },

    /// The external transfer tool ran past its deadline and was killed
    #[error("Transfer of '{path}' exceeded the {limit_secs}s timeout")]
    TransferTimeout { path: PathBuf, limit_secs: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PlotMoverError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(
        user: impl Into<String>,
        host: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AuthenticationError {
            user: user.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a remote command error
    pub fn remote(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCommandError {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Get the local path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::TransferTimeout { path, .. }
            | Self::TransferSpawn { tool: path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for PlotMover operations
pub type Result<T> = std::result::Result<T, PlotMoverError>;

impl From<serde_json::Error> for PlotMoverError {
    fn from(err: serde_json::Error) -> Self {
        PlotMoverError::ConfigError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| PlotMoverError::io(path, e))
    }
}
