//! Persistence of the event list in a key-value store.
//!
//! A [`KeyValueStore`] holds text values by key, the way browser local
//! storage does. [`StorageAdapter`] keeps the whole event list as one JSON
//! array under a single key and always rewrites it in full.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info};

use super::error::{StorageError, StorageResult};
use super::event::Event;

/// Key the event list lives under unless configured otherwise.
pub const DEFAULT_KEY: &str = "EVENTS";

/// Text values addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replaces any previous value under `key`.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

fn check_quota(key: &str, value: &str, quota: Option<usize>) -> StorageResult<()> {
    match quota {
        Some(quota) if value.len() > quota => Err(StorageError::QuotaExceeded {
            key: key.to_string(),
            needed: value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStore {
    /// Opens the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Opened file store at {}", dir.display());
        Ok(Self { dir, quota: None })
    }

    /// Caps the size in bytes of any single value.
    pub fn with_quota(mut self, quota: Option<usize>) -> Self {
        self.quota = quota;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let usable = !key.is_empty()
            && !key.starts_with('.')
            && !key.contains(['/', '\\']);
        if !usable {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        check_quota(key, value, self.quota)?;

        // Write aside and rename so a crash never leaves a half-written list.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same entries, so a test can keep a
/// handle to inspect or tamper with what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Rc<Cell<Option<usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_quota(&self, quota: Option<usize>) {
        self.quota.set(quota);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn put_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        check_quota(key, value, self.quota.get())?;
        self.put_raw(key, value);
        Ok(())
    }
}

/// Reads and writes the full event list under one key.
pub struct StorageAdapter {
    backend: Box<dyn KeyValueStore>,
    key: String,
}

impl StorageAdapter {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            key: DEFAULT_KEY.to_string(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the stored list. A missing or blank value is an empty list.
    pub fn load(&self) -> StorageResult<Vec<Event>> {
        let Some(content) = self.backend.get(&self.key)? else {
            info!("No stored events under '{}', starting empty", self.key);
            return Ok(Vec::new());
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let events: Vec<Event> =
            serde_json::from_str(&content).map_err(|source| StorageError::Malformed {
                key: self.key.clone(),
                source,
            })?;
        info!("Loaded {} events from '{}'", events.len(), self.key);
        Ok(events)
    }

    /// Overwrites the stored list with `events`.
    pub fn save(&mut self, events: &[Event]) -> StorageResult<()> {
        let content = serde_json::to_string(events).map_err(StorageError::Serialize)?;
        self.backend.set(&self.key, &content)?;
        debug!("Saved {} events to '{}'", events.len(), self.key);
        Ok(())
    }}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::event::{EventColor, EventDetails};
    use chrono::{NaiveDate, NaiveTime};

    fn sample_events() -> Vec<Event> {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        vec![
            Event::new(
                "1",
                EventDetails::timed(
                    "Standup",
                    EventColor::Blue,
                    date,
                    NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
                ),
            ),
            Event::new("2", EventDetails::all_day("Offsite", EventColor::Green, date)),
        ]
    }

    #[test]
    fn empty_storage_loads_empty_list() {
        let adapter = StorageAdapter::new(MemoryStore::new());
        assert!(adapter.load().unwrap().is_empty());
    }

    #[test]
    fn blank_value_loads_empty_list() {
        let mem = MemoryStore::new();
        mem.put_raw(DEFAULT_KEY, "  \n");
        let adapter = StorageAdapter::new(mem);
        assert!(adapter.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_returns_same_events() {
        let mut adapter = StorageAdapter::new(MemoryStore::new());
        let events = sample_events();

        adapter.save(&events).unwrap();
        assert_eq!(adapter.load().unwrap(), events);
    }

    #[test]
    fn save_replaces_previous_value() {
        let mem = MemoryStore::new();
        let mut adapter = StorageAdapter::new(mem.clone());

        adapter.save(&sample_events()).unwrap();
        adapter.save(&sample_events()[..1]).unwrap();

        assert_eq!(adapter.load().unwrap().len(), 1);
        let raw = mem.raw(DEFAULT_KEY).unwrap();
        assert!(!raw.contains("Offsite"));
    }

    #[test]
    fn malformed_value_is_an_error() {
        let mem = MemoryStore::new();
        mem.put_raw(DEFAULT_KEY, "{not json");
        let adapter = StorageAdapter::new(mem);

        let err = adapter.load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed { ref key, .. } if key == DEFAULT_KEY));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let mem = MemoryStore::new();
        mem.put_raw(DEFAULT_KEY, r#"{"id":"1"}"#);
        let adapter = StorageAdapter::new(mem);
        assert!(matches!(adapter.load(), Err(StorageError::Malformed { .. })));
    }

    #[test]
    fn quota_rejects_large_values() {
        let mem = MemoryStore::new();
        mem.set_quota(Some(10));
        let mut adapter = StorageAdapter::new(mem.clone());

        let err = adapter.save(&sample_events()).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 10, .. }));
        assert!(mem.raw(DEFAULT_KEY).is_none());
    }

    #[test]
    fn custom_key_is_used() {
        let mem = MemoryStore::new();
        let mut adapter = StorageAdapter::new(mem.clone()).with_key("work");
        adapter.save(&sample_events()).unwrap();

        assert!(mem.raw("work").is_some());
        assert!(mem.raw(DEFAULT_KEY).is_none());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let events = sample_events();

        {
            let store = FileStore::open(dir.path()).unwrap();
            StorageAdapter::new(store).save(&events).unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        let loaded = StorageAdapter::new(store).load().unwrap();
        assert_eq!(loaded, events);
        assert!(dir.path().join("EVENTS.json").exists());
        assert!(!dir.path().join(".EVENTS.json.tmp").exists());
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();
        assert_eq!(store.get("EVENTS").unwrap(), None);
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(store.set(key, "[]"), Err(StorageError::InvalidKey(_))));
        }
    }

    #[test]
    fn file_store_quota() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap().with_quota(Some(4));

        assert!(store.set("k", "[]").is_ok());
        assert!(matches!(
            store.set("k", "[1,2,3]"),
            Err(StorageError::QuotaExceeded { needed: 7, .. })
        ));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[]"));
    }
}
