//! Process signalling port (interface).

use crate::error::SignalError;

/// Signals used by the termination protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Graceful termination request (SIGTERM).
    Terminate,
    /// Unconditional termination (SIGKILL).
    Kill,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Terminate => write!(f, "SIGTERM"),
            Signal::Kill => write!(f, "SIGKILL"),
        }
    }
}

/// Port for delivering signals to processes.
///
/// Both operations are single syscalls on Unix and never block.
pub trait Signaller: Send + Sync {
    /// Deliver `signal` to `pid`.
    ///
    /// A missing process must be reported as [`SignalError::NoSuchProcess`]
    /// so callers can tell it apart from every other failure.
    fn send(&self, pid: i32, signal: Signal) -> Result<(), SignalError>;

    /// Zero-effect existence check (signal 0).
    fn is_alive(&self, pid: i32) -> bool;
}
