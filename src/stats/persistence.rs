use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::stats::models::StatsStore;

/// Narrow persistence port for the stats store. The aggregator never assumes
/// a specific storage technology behind it.
pub trait StatsPersistence: Send + Sync {
    /// Current store, or None when absent or unreadable (a corrupt store is
    /// reported and discarded, not an error).
    fn load(&self) -> Option<StatsStore>;

    /// Whole-store replace. Not atomic: single-writer operation is assumed.
    fn save(&self, store: &StatsStore) -> Result<()>;
}

/// JSON file store, the layout the dashboard reads.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatsPersistence for JsonFileStore {
    fn load(&self) -> Option<StatsStore> {
        if !self.path.exists() {
            return None;
        }

        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to read stats file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&data) {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(
                    "Stats file {} is corrupt, starting fresh: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn save(&self, store: &StatsStore) -> Result<()> {
        let data = serde_json::to_string_pretty(store)
            .map_err(|e| anyhow!("Failed to serialize stats store: {}", e))?;
        fs::write(&self.path, data)
            .map_err(|e| anyhow!("Failed to write stats file {}: {}", self.path.display(), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_corrupt_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFileStore::new(dir.path().join("stats.json"));

        let mut store = StatsStore::default();
        store.total_scans = 7;
        store.total_opportunities = 3;
        file.save(&store).unwrap();

        let loaded = file.load().unwrap();
        assert_eq!(loaded.total_scans, 7);
        assert_eq!(loaded.total_opportunities, 3);
        assert!(loaded.scan_history.is_empty());
    }
}
