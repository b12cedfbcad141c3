//! Application layer - use case services.
//!
//! - `terminator`: two-phase SIGTERM/SIGKILL process termination
//! - `orchestrator`: snapshot store, scan coordination and the refresh scheduler
//!
//! Both depend only on the traits in `ports`, so tests drive them with
//! in-memory sources and signallers.

mod orchestrator;
mod terminator;

pub use orchestrator::{Command, OrchestratorHandle, ScanOrchestrator, Scheduler, StoreView};
pub use terminator::{KillRequest, KillState, ProcessTerminator};
