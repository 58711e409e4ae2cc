//! Core coordination module
//!
//! Ties discovery, locking, transfer, and verification together into
//! the end-to-end job life cycle, and wraps the external bulk-copy
//! tool behind a transport seam.

mod coordinator;
mod transfer;

pub use coordinator::*;
pub use transfer::*;
