//! Domain layer - Pure business logic and data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod category;
mod entry;
mod filter;
mod outcome;

// Re-export all domain types
pub use category::{categorize, Category, UnknownCategory};
pub use entry::{EntryKey, ListeningEntry, Snapshot};
pub use filter::{apply, histogram, EntryFilter};
pub use outcome::{KillReport, TerminationOutcome};
