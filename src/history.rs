//! Bounded history of past fusions, persisted as one JSON slot in a
//! key/value store.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::{FusionResult, HistoryEntry};

pub const HISTORY_KEY: &str = "fusician-history";
pub const MAX_ENTRIES: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid key {0:?}")]
    InvalidKey(String),
}

/// Named string slots.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per slot.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.slot_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.root)?;
        // Atomic replace.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Most-recent-first list of at most [`MAX_ENTRIES`] fusions, text only.
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Loads the persisted slot. Missing, unreadable or corrupt data starts
    /// an empty history.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let entries = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(MAX_ENTRIES);
                    for entry in &mut entries {
                        entry.result = entry.result.without_images();
                    }
                    entries
                }
                Err(e) => {
                    warn!("Stored history is corrupt, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read stored history, starting empty: {}", e);
                Vec::new()
            }
        };
        info!("📚 Loaded {} history entries", entries.len());
        Self { store, entries: RwLock::new(entries) }
    }

    /// Records a fusion at the front, dropping the oldest past the bound.
    /// Images are never kept.
    pub fn append(&self, result: &FusionResult, items: Vec<String>) -> HistoryEntry {
        let mut entries = self.entries.write();
        let entry = HistoryEntry {
            id: next_id(&entries),
            items,
            result: result.without_images(),
        };
        entries.insert(0, entry.clone());
        entries.truncate(MAX_ENTRIES);
        self.persist(&entries);
        entry
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.entries.read().iter().find(|e| e.id == id).cloned()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.clear();
        self.persist(&entries);
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        let result = serde_json::to_string(entries)
            .map_err(|e| e.to_string())
            .and_then(|json| self.store.set(HISTORY_KEY, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            error!("❌ Failed to persist history: {}", e);
        }
    }
}

/// Current time in milliseconds, moved past every existing id so ids stay
/// unique and ordered.
fn next_id(entries: &[HistoryEntry]) -> String {
    let latest = entries
        .iter()
        .filter_map(|e| DateTime::parse_from_rfc3339(&e.id).ok())
        .map(|t| t.timestamp_millis())
        .max();
    let mut millis = Utc::now().timestamp_millis();
    if let Some(latest) = latest {
        millis = millis.max(latest + 1);
    }
    let at = Utc.timestamp_millis_opt(millis).single().unwrap_or_else(Utc::now);
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
