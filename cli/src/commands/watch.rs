//! Watch command - periodically refreshed listing.

use anyhow::Result;
use portsnap_core::{Category, EngineConfig, ScanOrchestrator, Scheduler, StoreView};
use serde_json::json;
use tokio::signal;

use super::list::{print_summary, print_table};

/// Clear screen and move the cursor home.
const CLEAR: &str = "\x1b[2J\x1b[H";

pub async fn run(category: Option<Category>, search: Option<String>, json: bool) -> Result<()> {
    let config = EngineConfig::default();
    let handle = ScanOrchestrator::from_config(&config);
    handle.set_category(category)?;
    handle.set_search(search.unwrap_or_default())?;

    let scheduler = Scheduler::new(handle.clone(), config.refresh_interval);
    scheduler.start();

    let mut views = handle.subscribe();
    let mut printed = 0;
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                // Only redraw once per completed scan
                if view.completed_scans == printed {
                    continue;
                }
                printed = view.completed_scans;
                render(&view, json)?;
            }
        }
    }

    scheduler.stop();
    Ok(())
}

fn render(view: &StoreView, json: bool) -> Result<()> {
    if json {
        let line = json!({
            "scannedAt": view.snapshot.scanned_at(),
            "failure": view.snapshot.failure(),
            "entries": view.entries,
            "lastKill": view.last_kill,
        });
        println!("{}", serde_json::to_string(&line)?);
        return Ok(());
    }

    print!("{}", CLEAR);
    print_table(&view.entries);
    print_summary(&view.snapshot, view.entries.len());
    println!("Press Ctrl-C to stop.");
    Ok(())
}
