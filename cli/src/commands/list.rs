//! List command - show all listening ports.

use anyhow::{Context, Result};
use chrono::Local;
use portsnap_core::ports::ListingSource;
use portsnap_core::{apply, histogram, Category, ListeningEntry, PortScanner, Snapshot};

pub async fn run(category: Option<Category>, search: Option<String>, json: bool) -> Result<()> {
    let scanner = PortScanner::new();
    let entries = scanner
        .try_scan()
        .await
        .context("Failed to scan listening ports")?;
    let snapshot = Snapshot::new(entries);

    let entries = apply(snapshot.entries(), category, search.as_deref().unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    print_table(&entries);
    print_summary(&snapshot, entries.len());
    Ok(())
}

/// Print entries as a fixed-width table.
pub fn print_table(entries: &[ListeningEntry]) {
    if entries.is_empty() {
        println!("No listening ports found.");
        return;
    }

    // Table header
    println!(
        "{:<6} {:<8} {:<20} {:<12} {:<15} TYPE",
        "PORT", "PID", "PROCESS", "USER", "ADDRESS"
    );
    println!("{}", "-".repeat(70));

    for entry in entries {
        println!(
            "{:<6} {:<8} {:<20} {:<12} {:<15} {}",
            entry.port,
            entry.pid,
            truncate(&entry.process_name, 20),
            truncate(&entry.user, 12),
            truncate(&entry.address, 15),
            entry.category().short_name()
        );
    }
}

/// Print the totals line, category counts and scan time.
pub fn print_summary(snapshot: &Snapshot, shown: usize) {
    let counts: Vec<String> = histogram(snapshot.entries())
        .into_iter()
        .map(|(category, count)| format!("{} {}", category.display_name(), count))
        .collect();

    println!(
        "\nShowing {} of {} ports{}",
        shown,
        snapshot.len(),
        if counts.is_empty() {
            String::new()
        } else {
            format!(" ({})", counts.join(", "))
        }
    );
    println!(
        "Scanned at {}",
        snapshot.scanned_at().with_timezone(&Local).format("%H:%M:%S")
    );
    if let Some(reason) = snapshot.failure() {
        println!("Last scan failed: {}", reason);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max - 1).collect();
        format!("{}…", kept)
    }
}
