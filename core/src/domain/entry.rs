//! Listening socket entries and scan snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Category;

/// Composite identity of a listening entry within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub pid: i32,
    pub port: u16,
}

/// One listening TCP socket and the process that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListeningEntry {
    /// The port number (e.g., 3000, 8080).
    pub port: u16,
    /// Process ID of the owning process. Always positive for scanned entries.
    pub pid: i32,
    /// Short name of the owning executable, as reported by lsof.
    pub process_name: String,
    /// Username of the process owner.
    pub user: String,
    /// Bind address: an IPv4 literal, an IPv6 literal, or `*`.
    pub address: String,
}

impl ListeningEntry {
    pub fn new(
        port: u16,
        pid: i32,
        process_name: impl Into<String>,
        user: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            port,
            pid,
            process_name: process_name.into(),
            user: user.into(),
            address: address.into(),
        }
    }

    /// Deduplication key.
    pub fn key(&self) -> EntryKey {
        EntryKey {
            pid: self.pid,
            port: self.port,
        }
    }

    /// Usage category of this entry's port.
    pub fn category(&self) -> Category {
        Category::of(self.port)
    }

    /// Check if this entry matches a search query.
    ///
    /// Searches the process name, port number and PID.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let query_lower = query.to_lowercase();
        self.process_name.to_lowercase().contains(&query_lower)
            || self.port.to_string().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
    }
}

impl std::fmt::Display for ListeningEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} (PID: {}, Process: {})",
            self.address, self.port, self.pid, self.process_name
        )
    }
}

/// Result of one full scan cycle. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    entries: Vec<ListeningEntry>,
    scanned_at: DateTime<Utc>,
    failure: Option<String>,
}

impl Snapshot {
    /// Snapshot of a successful scan, stamped now.
    pub fn new(entries: Vec<ListeningEntry>) -> Self {
        Self {
            entries,
            scanned_at: Utc::now(),
            failure: None,
        }
    }

    /// Empty snapshot recording why the scan could not run.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            scanned_at: Utc::now(),
            failure: Some(reason.into()),
        }
    }

    /// Placeholder used before the first scan completes.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn entries(&self) -> &[ListeningEntry] {
        &self.entries
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// Why the scan failed, if it did. An empty snapshot without a failure
    /// means there really were no listeners.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key() {
        let entry = ListeningEntry::new(3000, 1234, "node", "code", "127.0.0.1");
        assert_eq!(entry.key(), EntryKey { pid: 1234, port: 3000 });
        assert_eq!(entry.category(), Category::WebDev);
    }

    #[test]
    fn test_matches_search() {
        let entry = ListeningEntry::new(3000, 1234, "Node", "testuser", "127.0.0.1");

        assert!(entry.matches_search("node"));
        assert!(entry.matches_search("NODE"));
        assert!(entry.matches_search("300"));
        assert!(entry.matches_search("123"));
        assert!(entry.matches_search("")); // Empty query matches all
        assert!(!entry.matches_search("testuser")); // user is not searched
        assert!(!entry.matches_search("127.0.0.1")); // neither is the address
    }

    #[test]
    fn test_failed_snapshot() {
        let snapshot = Snapshot::failed("lsof not found");
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.failure(), Some("lsof not found"));

        let snapshot = Snapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.failure().is_none());
    }
}
