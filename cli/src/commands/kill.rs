//! Kill command - stop processes by port or PID.

use anyhow::{bail, Context, Result};
use portsnap_core::ports::ListingSource;
use portsnap_core::{
    EngineConfig, KillReport, ListeningEntry, PortScanner, ProcessTerminator, TerminationOutcome, UnixSignaller,
};

pub async fn run(port: Option<u16>, pid: Option<i32>, json: bool) -> Result<()> {
    let config = EngineConfig::default();
    let terminator =
        ProcessTerminator::with_grace_period(UnixSignaller::new(), config.grace_period);

    let targets: Vec<(i32, Option<u16>)> = match (port, pid) {
        (_, Some(pid)) => vec![(pid, None)],
        (Some(port), None) => {
            let scanner = PortScanner::with_config(config.scanner);
            let entries = scanner
                .try_scan()
                .await
                .context("Failed to scan listening ports")?;

            let pids = pids_on_port(&entries, port);
            if pids.is_empty() {
                bail!("No process is listening on port {}", port);
            }
            pids.into_iter().map(|pid| (pid, Some(port))).collect()
        }
        (None, None) => bail!("Either a port or --pid is required"),
    };

    let mut reports: Vec<KillReport> = Vec::with_capacity(targets.len());
    for (pid, port) in targets {
        let mut request = terminator.request(pid, port);
        request.send_graceful();
        reports.push(request.resolve().await);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report);
        }
    }

    if reports
        .iter()
        .any(|r| matches!(r.outcome, TerminationOutcome::Failed(_)))
    {
        bail!("Some processes could not be stopped");
    }
    Ok(())
}

/// Distinct PIDs listening on `port`, ascending.
fn pids_on_port(entries: &[ListeningEntry], port: u16) -> Vec<i32> {
    let mut pids: Vec<i32> = entries
        .iter()
        .filter(|e| e.port == port)
        .map(|e| e.pid)
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pids_on_port_are_distinct() {
        let entries = vec![
            ListeningEntry::new(3000, 20, "node", "code", "127.0.0.1"),
            ListeningEntry::new(8080, 30, "java", "code", "*"),
            ListeningEntry::new(3000, 10, "node", "code", "::1"),
            ListeningEntry::new(3000, 20, "node", "code", "::1"),
        ];
        assert_eq!(pids_on_port(&entries, 3000), vec![10, 20]);
        assert!(pids_on_port(&entries, 22).is_empty());
    }
}
