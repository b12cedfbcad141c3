//! Listening socket source port (interface).

use crate::domain::ListeningEntry;
use crate::error::Result;

/// Port for enumerating listening TCP sockets.
///
/// This trait defines the interface for port scanning functionality.
/// Implementations handle platform-specific details (lsof invocation, parsing).
pub trait ListingSource: Send + Sync {
    /// Enumerate all listening TCP sockets.
    ///
    /// Returns deduplicated entries in source order. An error means the
    /// enumeration itself could not run, not that nothing is listening.
    fn try_scan(&self) -> impl std::future::Future<Output = Result<Vec<ListeningEntry>>> + Send;
}
