//! Persisted key-value storage shared by every context.
//!
//! Values are JSON. Every write that actually changes a key is broadcast
//! as a [`StorageChange`] to all subscribers, which is how a testing-mode
//! toggle in the popup reaches running background and content contexts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::warn;

use crate::error::StorageError;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Write all `items` at once; one change notification per modified key.
    fn set(&self, items: Map<String, Value>) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn all(&self) -> Result<Map<String, Value>, StorageError>;

    fn clear(&self) -> Result<(), StorageError>;

    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;

    fn set_value(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut items = Map::new();
        items.insert(key.to_string(), value);
        self.set(items)
    }
}

/// JSON-object store, optionally mirrored to a file on every write.
pub struct LocalStore {
    path: Option<PathBuf>,
    data: RwLock<Map<String, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::with_data(None, Map::new())
    }

    /// Open a file-backed store. A missing file starts empty; unreadable
    /// JSON is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StorageError::ReadFailed {
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(
                        path = %path.display(),
                        "settings file is not a JSON object, starting empty"
                    );
                    Map::new()
                }
            }
        } else {
            Map::new()
        };
        Ok(Self::with_data(Some(path), data))
    }

    fn with_data(path: Option<PathBuf>, data: Map<String, Value>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path,
            data: RwLock::new(data),
            changes,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized =
            serde_json::to_string_pretty(data).map_err(|e| StorageError::Corrupt(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::WriteFailed {
                path: path.clone(),
                source,
            })?;
        }
        fs::write(path, serialized).map_err(|source| StorageError::WriteFailed {
            path: path.clone(),
            source,
        })
    }

    fn notify(&self, changes: Vec<StorageChange>) {
        for change in changes {
            // No subscribers is fine.
            let _ = self.changes.send(change);
        }
    }
}

impl KvStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let guard = self.data.read().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, items: Map<String, Value>) -> Result<(), StorageError> {
        let changes = {
            let mut guard = self.data.write().map_err(|_| StorageError::Poisoned)?;
            let mut staged = guard.clone();
            let mut changes = Vec::new();
            for (key, value) in items {
                let old_value = staged.insert(key.clone(), value.clone());
                if old_value.as_ref() != Some(&value) {
                    changes.push(StorageChange {
                        key,
                        old_value,
                        new_value: Some(value),
                    });
                }
            }
            if !changes.is_empty() {
                self.persist(&staged)?;
                *guard = staged;
            }
            changes
        };
        self.notify(changes);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let change = {
            let mut guard = self.data.write().map_err(|_| StorageError::Poisoned)?;
            let mut staged = guard.clone();
            let Some(old_value) = staged.remove(key) else {
                return Ok(());
            };
            self.persist(&staged)?;
            *guard = staged;
            StorageChange {
                key: key.to_string(),
                old_value: Some(old_value),
                new_value: None,
            }
        };
        self.notify(vec![change]);
        Ok(())
    }

    fn all(&self) -> Result<Map<String, Value>, StorageError> {
        let guard = self.data.read().map_err(|_| StorageError::Poisoned)?;
        Ok(guard.clone())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let changes = {
            let mut guard = self.data.write().map_err(|_| StorageError::Poisoned)?;
            self.persist(&Map::new())?;
            let old = std::mem::take(&mut *guard);
            old.into_iter()
                .map(|(key, old_value)| StorageChange {
                    key,
                    old_value: Some(old_value),
                    new_value: None,
                })
                .collect()
        };
        self.notify(changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn set_notifies_only_changed_keys() {
        let store = LocalStore::in_memory();
        let mut rx = store.subscribe();

        store.set_value("inTestingMode", json!(true)).unwrap();
        store.set_value("inTestingMode", json!(true)).unwrap();
        store.set_value("inTestingMode", json!(false)).unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.key, "inTestingMode");
        assert_eq!(first.old_value, None);
        assert_eq!(first.new_value, Some(json!(true)));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.old_value, Some(json!(true)));
        assert_eq!(second.new_value, Some(json!(false)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn remove_and_clear_notify_with_no_new_value() {
        let store = LocalStore::in_memory();
        store.set_value("a", json!(1)).unwrap();
        store.set_value("b", json!(2)).unwrap();
        let mut rx = store.subscribe();

        store.remove("a").unwrap();
        store.remove("a").unwrap();
        store.clear().unwrap();

        let removed = rx.try_recv().unwrap();
        assert_eq!((removed.key.as_str(), removed.new_value), ("a", None));
        let cleared = rx.try_recv().unwrap();
        assert_eq!(cleared.key, "b");
        assert!(rx.try_recv().is_err());
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        {
            let store = LocalStore::open(&path).unwrap();
            store.set_value("suggestionFrequencyMinutes", json!(10)).unwrap();
        }
        let reopened = LocalStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("suggestionFrequencyMinutes").unwrap(),
            Some(json!(10))
        );
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let store = LocalStore::open(blocker.join("settings.json")).unwrap();
        let mut rx = store.subscribe();

        assert!(store.set_value("inTestingMode", json!(true)).is_err());
        assert_eq!(store.get("inTestingMode").unwrap(), None);
        assert!(rx.try_recv().is_err());

        // A retry still sees a change to make and fails again.
        assert!(store.set_value("inTestingMode", json!(true)).is_err());
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn failed_remove_and_clear_keep_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = LocalStore::open(&path).unwrap();
        store.set_value("a", json!(1)).unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        let mut rx = store.subscribe();

        assert!(store.remove("a").is_err());
        assert!(store.clear().is_err());
        assert_eq!(store.get("a").unwrap(), Some(json!(1)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = LocalStore::open(&path).unwrap();
        assert!(store.all().unwrap().is_empty());
    }
}
