//! Portsnap Core Library
//!
//! Enumerates listening TCP sockets on the local machine, classifies their
//! ports and terminates the owning processes.
//!
//! Provides functionality to:
//! - Scan listening TCP sockets through `lsof`
//! - Classify ports into categories and filter listings
//! - Terminate processes gracefully, escalating to SIGKILL
//! - Keep a refreshed snapshot behind a single-owner store task
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - macOS and Linux: `lsof` and POSIX signals

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-export domain types (primary API)
pub use domain::{
    apply, categorize, histogram, Category, EntryFilter, EntryKey, KillReport, ListeningEntry,
    Snapshot, TerminationOutcome, UnknownCategory,
};

// Re-export other commonly used types
pub use adapters::{parse_address, PortScanner, UnixSignaller};
pub use application::{
    Command, OrchestratorHandle, ProcessTerminator, ScanOrchestrator, Scheduler, StoreView,
};
pub use config::{EngineConfig, ScannerConfig};
pub use error::{AddressError, Error, Result, SignalError};
