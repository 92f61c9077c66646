//! Per-session clip store
//!
//! Owns the reconciled OCF and sound clip maps for the current project
//! session. Maps are keyed by clip name and keep first-insertion order.

use crate::error::IngestResult;
use crate::models::{ClipRecord, IngestKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stored clip maps, one per ingest kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipStore {
    #[serde(default)]
    pub ocf: IndexMap<String, ClipRecord>,
    #[serde(default)]
    pub sound: IndexMap<String, ClipRecord>,
}

impl ClipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clips(&self, kind: IngestKind) -> &IndexMap<String, ClipRecord> {
        match kind {
            IngestKind::Ocf => &self.ocf,
            IngestKind::Sound => &self.sound,
        }
    }

    pub fn clips_mut(&mut self, kind: IngestKind) -> &mut IndexMap<String, ClipRecord> {
        match kind {
            IngestKind::Ocf => &mut self.ocf,
            IngestKind::Sound => &mut self.sound,
        }
    }

    /// Load a store from JSON; a missing file yields an empty store
    pub fn load(path: &Path) -> IngestResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No clip store yet, starting empty");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the store as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> IngestResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::debug!(
            path = %path.display(),
            ocf = self.ocf.len(),
            sound = self.sound.len(),
            "Saved clip store"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClipCopy;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session").join("store.json");

        let mut store = ClipStore::new();
        let copy = ClipCopy {
            volume: "RAID".to_string(),
            hash: None,
        };
        store
            .clips_mut(IngestKind::Sound)
            .insert("T001".to_string(), ClipRecord::new("T001", 5, vec![copy]));
        store.save(&path).unwrap();

        let loaded = ClipStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert!(loaded.clips(IngestKind::Ocf).is_empty());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = ClipStore::load(&temp_dir.path().join("absent.json")).unwrap();
        assert_eq!(store, ClipStore::default());
    }
}
