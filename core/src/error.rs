//! Error types for the portsnap-core library.

use thiserror::Error;

/// Result type alias for portsnap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating listening sockets.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The orchestrator's store task is no longer running.
    #[error("Orchestrator has shut down")]
    Shutdown,
}

/// Errors produced when a socket endpoint cannot be split into host and port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// No `:` separating host and port.
    #[error("missing port separator in {0:?}")]
    MissingSeparator(String),

    /// An IPv6 endpoint without its closing bracket.
    #[error("unterminated IPv6 bracket in {0:?}")]
    UnclosedBracket(String),

    /// The port component is empty, non-numeric or above 65535.
    #[error("invalid port {port:?} in {address:?}")]
    InvalidPort { address: String, port: String },
}

/// Errors from delivering a signal to a process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The target process id does not refer to a live process.
    #[error("Process {0} not found")]
    NoSuchProcess(i32),

    /// The caller lacks permission to signal the process.
    #[error("Permission denied to signal process {pid}: {reason}")]
    Denied { pid: i32, reason: String },

    /// Any other delivery failure.
    #[error("Failed to signal process {pid}: {reason}")]
    Other { pid: i32, reason: String },
}

impl SignalError {
    /// Human readable reason, without the process id prefix.
    pub fn reason(&self) -> String {
        match self {
            SignalError::NoSuchProcess(_) => "No such process".to_string(),
            SignalError::Denied { reason, .. } | SignalError::Other { reason, .. } => {
                reason.clone()
            }
        }
    }
}
