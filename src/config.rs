//! Default paths and runtime settings.
//!
//! CHANGELOG:
//! - 10/16/2026 - Initial implementation

use std::path::PathBuf;
use std::time::Duration;

/// Env var overriding the snapshot path.
pub const SNAPSHOT_ENV: &str = "WOLFIES_WHATSAPP_SNAPSHOT";

/// Default daemon socket (tilde-expanded by the binaries).
pub const DEFAULT_SOCKET: &str = "~/.wolfies-whatsapp/daemon.sock";

/// Default store snapshot path.
///
/// Tries, in order:
/// 1. WOLFIES_WHATSAPP_SNAPSHOT env var
/// 2. ~/.wolfies-whatsapp/store.json
/// 3. ./store.json
pub fn default_snapshot_path() -> PathBuf {
    if let Ok(path) = std::env::var(SNAPSHOT_ENV) {
        return PathBuf::from(path);
    }

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".wolfies-whatsapp").join("store.json");
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("store.json")
}

/// Resolve an optional CLI path against the defaults.
pub fn snapshot_path(cli: Option<&str>) -> PathBuf {
    match cli {
        Some(p) => PathBuf::from(shellexpand::tilde(p).to_string()),
        None => default_snapshot_path(),
    }
}

/// Settings the daemon and CLI pass into the store.
#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    pub snapshot: PathBuf,
    pub refresh_latency: Duration,
}

impl StoreSettings {
    pub fn new(snapshot: Option<&str>, refresh_latency_ms: u64) -> Self {
        Self {
            snapshot: snapshot_path(snapshot),
            refresh_latency: Duration::from_millis(refresh_latency_ms),
        }
    }

    /// Load the configured snapshot into a memory store.
    pub fn open_store(&self) -> anyhow::Result<crate::store::MemoryStore> {
        Ok(crate::store::MemoryStore::load(&self.snapshot)?.with_refresh_latency(self.refresh_latency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_path_wins() {
        assert_eq!(snapshot_path(Some("/tmp/s.json")), PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn test_settings_latency() {
        let settings = StoreSettings::new(Some("/tmp/s.json"), 250);
        assert_eq!(settings.refresh_latency, Duration::from_millis(250));
    }
}
