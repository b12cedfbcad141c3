//! Port scanner adapters.
//!
//! Enumerates listening TCP sockets through lsof.

mod address;
mod lsof;

use tracing::warn;

use crate::config::ScannerConfig;
use crate::domain::ListeningEntry;
use crate::error::Result;
use crate::ports::ListingSource;

pub use address::parse_address;
pub use lsof::LsofScanner;

/// The main port scanner.
pub struct PortScanner {
    inner: LsofScanner,
}

impl PortScanner {
    /// Create a scanner using the default lsof location.
    pub fn new() -> Self {
        Self::with_config(ScannerConfig::default())
    }

    pub fn with_config(config: ScannerConfig) -> Self {
        Self {
            inner: LsofScanner::new(config),
        }
    }

    /// Scan all listening TCP ports.
    ///
    /// Never fails: if lsof cannot be run or its output cannot be decoded,
    /// the result is empty. Use [`ListingSource::try_scan`] to see why.
    pub async fn scan(&self) -> Vec<ListeningEntry> {
        match self.inner.try_scan().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Port scan failed");
                Vec::new()
            }
        }
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingSource for PortScanner {
    async fn try_scan(&self) -> Result<Vec<ListeningEntry>> {
        self.inner.try_scan().await
    }
}
