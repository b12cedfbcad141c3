//! Config command - show the effective engine configuration.

use anyhow::Result;
use portsnap_core::EngineConfig;

pub fn show(json: bool) -> Result<()> {
    let config = EngineConfig::default();

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Refresh interval: {} ms", config.refresh_interval.as_millis());
    println!("Grace period:     {} ms", config.grace_period.as_millis());
    println!("lsof:             {}", config.scanner.lsof_path.display());
    Ok(())
}
