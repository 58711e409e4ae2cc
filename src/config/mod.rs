//! Configuration module for PlotMover
//!
//! Provides configuration management including CLI arguments,
//! the JSON config file, and runtime settings.

mod settings;

pub use settings::*;
