//! Engine configuration.
//!
//! Nothing is read from or written to disk. The defaults are the fixed
//! production values; tests construct shorter intervals directly.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Interval between periodic scans.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Grace period to wait between SIGTERM and SIGKILL (500ms).
pub const GRACE_PERIOD: Duration = Duration::from_millis(500);

#[cfg(target_os = "macos")]
const DEFAULT_LSOF: &str = "/usr/sbin/lsof";

#[cfg(not(target_os = "macos"))]
const DEFAULT_LSOF: &str = "lsof";

/// Settings for the listening-socket scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Path to the lsof executable. A bare name is resolved through `PATH`.
    #[serde(default = "default_lsof_path", rename = "lsofPath")]
    pub lsof_path: PathBuf,
}

fn default_lsof_path() -> PathBuf {
    PathBuf::from(DEFAULT_LSOF)
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            lsof_path: default_lsof_path(),
        }
    }
}

/// Timing and scanner settings for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the background refresh.
    #[serde(default = "default_refresh_interval", rename = "refreshInterval", with = "millis")]
    pub refresh_interval: Duration,

    /// Wait between the graceful and the forceful signal.
    #[serde(default = "default_grace_period", rename = "gracePeriod", with = "millis")]
    pub grace_period: Duration,

    #[serde(default)]
    pub scanner: ScannerConfig,
}

fn default_refresh_interval() -> Duration {
    REFRESH_INTERVAL
}

fn default_grace_period() -> Duration {
    GRACE_PERIOD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            grace_period: default_grace_period(),
            scanner: ScannerConfig::default(),
        }
    }
}

/// Durations are written as whole milliseconds.
mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
