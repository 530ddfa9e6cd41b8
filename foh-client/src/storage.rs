//! Durable key-value storage
//!
//! Storage is the source of truth for session state; the broadcast bus is
//! only a wake-up signal. Every mutation through [`SharedStore`] is
//! observable, which gives other contexts the storage-change fallback when
//! a broadcast is missed.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Keys used by the session layer.
pub mod keys {
    /// Admin bearer token.
    pub const ADMIN_TOKEN: &str = "token";
    /// Admin `userData`-shaped value.
    pub const ADMIN_USER: &str = "userData";
    /// Employee bearer token.
    pub const EMPLOYEE_TOKEN: &str = "employeeToken";
    /// Employee `userData`-shaped value.
    pub const EMPLOYEE_USER: &str = "employeeData";
}

/// Synchronous durable key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn delete(&self, key: &str) -> io::Result<()>;
}

/// In-memory store for tests and ephemeral contexts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
        Ok(())
    }
}

/// JSON-file-backed store.
///
/// The whole map is rewritten on every mutation; session state is a handful
/// of small keys.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Load the store, creating an empty one when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(io::Error::other)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn save(&self, entries: &HashMap<String, String>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries).map_err(io::Error::other)?;
        std::fs::write(&self.path, content)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::other("store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::other("store lock poisoned"))?;
        entries.remove(key);
        self.save(&entries)
    }
}

/// Mutation observed by every context sharing a store.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    pub key: String,
    /// None when the key was cleared with no replacement value.
    pub new_value: Option<String>,
}

/// A [`KeyValueStore`] plus a change broadcast.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<dyn KeyValueStore>,
    changes: broadcast::Sender<StorageEvent>,
}

impl SharedStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self { inner, changes }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    pub fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.inner.set(key, value)?;
        let _ = self.changes.send(StorageEvent {
            key: key.to_string(),
            new_value: Some(value.to_string()),
        });
        Ok(())
    }

    pub fn delete(&self, key: &str) -> io::Result<()> {
        self.inner.delete(key)?;
        let _ = self.changes.send(StorageEvent {
            key: key.to_string(),
            new_value: None,
        });
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shared_store_emits_mutations() {
        let store = SharedStore::in_memory();
        let mut changes = store.subscribe();

        store.set("token", "abc").unwrap();
        store.delete("token").unwrap();

        let set = changes.recv().await.unwrap();
        assert_eq!(set.key, "token");
        assert_eq!(set.new_value.as_deref(), Some("abc"));

        let cleared = changes.recv().await.unwrap();
        assert_eq!(cleared.key, "token");
        assert!(cleared.new_value.is_none());
    }

    #[test]
    fn file_store_persists_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session/store.json");

        {
            let store = FileStore::load(&path).unwrap();
            store.set(keys::ADMIN_TOKEN, "tok").unwrap();
            store.set(keys::ADMIN_USER, "{}").unwrap();
            store.delete(keys::ADMIN_USER).unwrap();
        }

        let store = FileStore::load(&path).unwrap();
        assert_eq!(store.get(keys::ADMIN_TOKEN).as_deref(), Some("tok"));
        assert!(store.get(keys::ADMIN_USER).is_none());
    }
}
