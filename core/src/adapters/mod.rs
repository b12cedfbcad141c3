//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

#[cfg(not(unix))]
compile_error!("Unsupported platform: portsnap needs a Unix system with lsof");

pub mod scanner;
pub mod signal;

// Re-export main types for convenience
pub use scanner::{parse_address, LsofScanner, PortScanner};
pub use signal::UnixSignaller;
