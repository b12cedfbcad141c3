//! Listening socket enumeration using lsof.

use std::collections::HashSet;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::config::ScannerConfig;
use crate::domain::{EntryKey, ListeningEntry};
use crate::error::{Error, Result};

use super::address::parse_address;

/// lsof flags:
/// - -iTCP: Show only TCP sockets
/// - -sTCP:LISTEN: Show only listening sockets
/// - -P: Show port numbers (don't resolve to service names)
/// - -n: Show IP addresses (don't resolve to hostnames)
const LSOF_ARGS: [&str; 4] = ["-iTCP", "-sTCP:LISTEN", "-P", "-n"];

/// COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME
const MIN_FIELDS: usize = 9;

/// Scanner that shells out to lsof.
pub struct LsofScanner {
    config: ScannerConfig,
}

impl LsofScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Run lsof and return everything it wrote to stdout.
    ///
    /// Stdout is read to the end before waiting on the child, otherwise a
    /// listing larger than the pipe buffer would block lsof forever.
    async fn run_lsof(&self) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.config.lsof_path)
            .args(LSOF_ARGS)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::CommandFailed(format!(
                    "Failed to run {}: {}",
                    self.config.lsof_path.display(),
                    e
                ))
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::CommandFailed("lsof stdout was not captured".to_string()))?;

        let mut output = Vec::new();
        stdout.read_to_end(&mut output).await?;
        drop(stdout);

        // lsof exits with 1 when nothing matches, so the status is only logged
        let status = child.wait().await?;
        debug!(status = %status, bytes = output.len(), "lsof finished");

        Ok(output)
    }

    /// Parse lsof output into listening entries.
    ///
    /// Expected lsof output format:
    /// ```text
    /// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
    /// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
    /// ```
    ///
    /// Malformed lines are skipped. Only the first entry per (PID, port) is kept.
    pub fn parse_lsof_output(&self, output: &str) -> Vec<ListeningEntry> {
        let mut entries = Vec::new();
        let mut seen: HashSet<EntryKey> = HashSet::new();

        // Skip header line
        for line in output.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }

            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < MIN_FIELDS {
                trace!(line, "Skipping short lsof line");
                continue;
            }

            // Extract and unescape process name
            let process_name = components[0]
                .replace("\\x20", " ") // Space
                .replace("\\x2f", "/"); // Slash

            let pid: i32 = match components[1].parse() {
                Ok(p) if p > 0 => p,
                _ => {
                    trace!(line, "Skipping lsof line with invalid PID");
                    continue;
                }
            };

            let user = components[2];

            // NAME is second to last; the last field is the (LISTEN) marker
            let name = components[components.len() - 2];
            let (address, port) = match parse_address(name) {
                Ok(parsed) => parsed,
                Err(e) => {
                    trace!(line, error = %e, "Skipping lsof line with bad address");
                    continue;
                }
            };

            let entry = ListeningEntry::new(port, pid, process_name, user, address);
            if !seen.insert(entry.key()) {
                continue;
            }
            entries.push(entry);
        }

        entries
    }

    /// Scan all listening TCP sockets.
    pub async fn try_scan(&self) -> Result<Vec<ListeningEntry>> {
        let output = self.run_lsof().await?;

        let stdout = String::from_utf8(output)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

        let entries = self.parse_lsof_output(&stdout);
        debug!(count = entries.len(), "Parsed listening sockets");
        Ok(entries)
    }
}

impl Default for LsofScanner {
    fn default() -> Self {
        Self::new(ScannerConfig::default())
    }
}
