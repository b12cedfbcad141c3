//! Termination outcomes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a single kill request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum TerminationOutcome {
    /// The process is gone.
    Success,
    /// The process could not be terminated.
    Failed(String),
    /// The process no longer existed when the first signal was sent.
    AlreadyTerminated,
}

impl std::fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationOutcome::Success => write!(f, "terminated"),
            TerminationOutcome::Failed(reason) => write!(f, "failed: {}", reason),
            TerminationOutcome::AlreadyTerminated => write!(f, "already terminated"),
        }
    }
}

/// An outcome tagged with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillReport {
    /// Unique identifier of the kill request.
    pub id: Uuid,
    /// Target process id.
    pub pid: i32,
    /// Port of the entry the kill was requested for, if any.
    pub port: Option<u16>,
    pub outcome: TerminationOutcome,
}

impl std::fmt::Display for KillReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "PID {} on :{}: {}", self.pid, port, self.outcome),
            None => write!(f, "PID {}: {}", self.pid, self.outcome),
        }
    }
}
