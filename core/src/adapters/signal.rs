//! POSIX signal delivery.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::SignalError;
use crate::ports::{Signal, Signaller};

/// Delivers signals with `kill(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixSignaller;

impl UnixSignaller {
    pub fn new() -> Self {
        Self
    }
}

fn map_errno(pid: i32, errno: Errno) -> SignalError {
    match errno {
        Errno::ESRCH => SignalError::NoSuchProcess(pid),
        Errno::EPERM => SignalError::Denied {
            pid,
            reason: errno.desc().to_string(),
        },
        other => SignalError::Other {
            pid,
            reason: other.desc().to_string(),
        },
    }
}

impl Signaller for UnixSignaller {
    fn send(&self, pid: i32, signal: Signal) -> Result<(), SignalError> {
        // kill(0) and kill(-n) address process groups
        if pid <= 0 {
            return Err(SignalError::Other {
                pid,
                reason: format!("invalid process id {}", pid),
            });
        }

        let nix_signal = match signal {
            Signal::Terminate => NixSignal::SIGTERM,
            Signal::Kill => NixSignal::SIGKILL,
        };

        debug!(pid = pid, signal = %signal, "Sending signal to process");
        kill(Pid::from_raw(pid), nix_signal).map_err(|errno| {
            let err = map_errno(pid, errno);
            match &err {
                SignalError::NoSuchProcess(_) => debug!(pid = pid, "Process not found"),
                _ => warn!(pid = pid, signal = %signal, error = %err, "Failed to send signal"),
            }
            err
        })
    }

    fn is_alive(&self, pid: i32) -> bool {
        if pid <= 0 {
            return false;
        }
        // EPERM means the process exists but belongs to someone else
        let alive = match kill(Pid::from_raw(pid), None::<NixSignal>) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        };
        debug!(pid = pid, alive = alive, "Process existence check");
        alive
    }
}
