//! Two-phase process termination.
//!
//! The graceful kill follows this pattern:
//! 1. Send SIGTERM to request graceful shutdown
//! 2. Wait 500ms for the process to clean up
//! 3. Check if process is still running
//! 4. If still running, send SIGKILL for immediate termination
//!
//! Step 1 runs synchronously in [`KillRequest::send_graceful`]; steps 2-4 run
//! in the future returned by [`KillRequest::resolve`], which can be spawned so
//! the grace period never blocks the caller.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GRACE_PERIOD;
use crate::domain::{KillReport, TerminationOutcome};
use crate::error::SignalError;
use crate::ports::{Signal, Signaller};

/// Progress of a single kill request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillState {
    /// Nothing sent yet.
    Idle,
    /// SIGTERM is being delivered.
    SignalSent,
    /// SIGTERM delivered, waiting before the existence probe.
    GracePeriod,
    /// Terminal. Holds the one and only outcome of the request.
    Resolved(TerminationOutcome),
}

/// Drives kill requests against a [`Signaller`].
pub struct ProcessTerminator<G> {
    signaller: Arc<G>,
    grace_period: Duration,
}

impl<G> Clone for ProcessTerminator<G> {
    fn clone(&self) -> Self {
        Self {
            signaller: Arc::clone(&self.signaller),
            grace_period: self.grace_period,
        }
    }
}

impl<G: Signaller> ProcessTerminator<G> {
    /// Create a terminator with the standard 500ms grace period.
    pub fn new(signaller: G) -> Self {
        Self::with_grace_period(signaller, GRACE_PERIOD)
    }

    pub fn with_grace_period(signaller: G, grace_period: Duration) -> Self {
        Self {
            signaller: Arc::new(signaller),
            grace_period,
        }
    }

    /// Start a kill request for `pid`, optionally remembering the port it
    /// was requested for. Nothing is sent until [`KillRequest::send_graceful`].
    pub fn request(&self, pid: i32, port: Option<u16>) -> KillRequest<G> {
        KillRequest {
            id: Uuid::new_v4(),
            pid,
            port,
            state: KillState::Idle,
            signaller: Arc::clone(&self.signaller),
            grace_period: self.grace_period,
        }
    }

    /// Run the whole protocol for `pid` and return its outcome.
    pub async fn terminate(&self, pid: i32) -> TerminationOutcome {
        let mut request = self.request(pid, None);
        request.send_graceful();
        request.resolve().await.outcome
    }
}

/// One kill request moving through [`KillState`].
pub struct KillRequest<G> {
    id: Uuid,
    pid: i32,
    port: Option<u16>,
    state: KillState,
    signaller: Arc<G>,
    grace_period: Duration,
}

impl<G: Signaller> KillRequest<G> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &KillState {
        &self.state
    }

    /// Phase 1: deliver SIGTERM.
    ///
    /// Moves to `GracePeriod` on success. A missing process resolves to
    /// `AlreadyTerminated`, any other failure to `Failed`. Calling this
    /// outside `Idle` does nothing.
    pub fn send_graceful(&mut self) -> &KillState {
        if self.state != KillState::Idle {
            return &self.state;
        }

        if self.pid <= 0 {
            warn!(pid = self.pid, "Refusing to signal invalid PID");
            self.state = KillState::Resolved(TerminationOutcome::Failed(format!(
                "invalid process id {}",
                self.pid
            )));
            return &self.state;
        }

        debug!(pid = self.pid, request = %self.id, "Attempting graceful kill");
        self.state = KillState::SignalSent;
        self.state = match self.signaller.send(self.pid, Signal::Terminate) {
            Ok(()) => {
                debug!(pid = self.pid, "SIGTERM sent, waiting for process to terminate");
                KillState::GracePeriod
            }
            Err(SignalError::NoSuchProcess(_)) => {
                debug!(pid = self.pid, "Process not found, already terminated");
                KillState::Resolved(TerminationOutcome::AlreadyTerminated)
            }
            Err(e) => {
                warn!(pid = self.pid, error = %e, "Failed to send SIGTERM");
                KillState::Resolved(TerminationOutcome::Failed(e.reason()))
            }
        };
        &self.state
    }

    /// Phase 2: wait out the grace period and escalate if needed.
    ///
    /// Sends SIGTERM first if the request is still `Idle`. Returns
    /// immediately when phase 1 already resolved the request.
    pub async fn resolve(mut self) -> KillReport {
        if self.state == KillState::Idle {
            self.send_graceful();
        }

        let outcome = match self.state {
            KillState::Resolved(ref outcome) => outcome.clone(),
            _ => self.finish_grace_period().await,
        };

        info!(pid = self.pid, request = %self.id, outcome = %outcome, "Kill request resolved");
        KillReport {
            id: self.id,
            pid: self.pid,
            port: self.port,
            outcome,
        }
    }

    async fn finish_grace_period(&self) -> TerminationOutcome {
        sleep(self.grace_period).await;

        if !self.signaller.is_alive(self.pid) {
            debug!(pid = self.pid, "Process terminated after SIGTERM");
            return TerminationOutcome::Success;
        }

        debug!(pid = self.pid, "Process still running, sending SIGKILL");
        match self.signaller.send(self.pid, Signal::Kill) {
            Ok(()) => TerminationOutcome::Success,
            // Exited between the probe and SIGKILL
            Err(SignalError::NoSuchProcess(_)) => TerminationOutcome::Success,
            Err(e) => {
                warn!(pid = self.pid, error = %e, "Failed to send SIGKILL");
                TerminationOutcome::Failed(e.reason())
            }
        }
    }
}
