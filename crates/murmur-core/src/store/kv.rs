//! Local persistent key-value store.
//!
//! Backs the per-user state trackers (read state, unread counts, clear
//! markers). One JSON document per key; a failed read is indistinguishable
//! from "no stored state" and a failed write is logged and otherwise ignored,
//! so storage trouble never blocks or interrupts a user action.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Object-safe raw string store; typed access goes through [`get_json`] and
/// [`set_json`].
pub trait KvStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: String);
}

/// Read a JSON value for `key`. Any failure (missing, unreadable, corrupt)
/// yields `None`.
pub fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = store.get_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("kv: discarding corrupt value for {key}: {e}");
            None
        }
    }
}

/// Write a JSON value for `key`. Serialization failures are logged and ignored.
pub fn set_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(raw) => store.set_raw(key, raw),
        Err(e) => tracing::warn!("kv: failed to serialize value for {key}: {e}"),
    }
}

/// Build the namespaced key for a per-user map: "{namespace}:{user_id}"
pub fn user_key(namespace: &str, user_id: &str) -> String {
    format!("{namespace}:{user_id}")
}

/// File-backed store: one `<key>.json` document per key under `data_dir`.
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Create the store, making sure the data directory exists. Directory
    /// creation failure is tolerated; reads and writes will simply no-op.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let dir = data_dir.as_ref().to_path_buf();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("kv: failed to create {}: {e}", dir.display());
        }
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // ':' namespace separators become '-' so keys stay plain filenames
        self.dir.join(format!("{}.json", key.replace(':', "-")))
    }
}

impl KvStore for FileKvStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set_raw(&self, key: &str, value: String) {
        let path = self.path_for(key);
        if let Err(e) = fs::write(&path, value) {
            tracing::warn!("kv: failed to write {}: {e}", path.display());
        }
    }
}

/// HashMap-backed store for tests and ephemeral sessions.
#[derive(Default)]
pub struct InMemoryKvStore {
    map: Mutex<HashMap<String, String>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryKvStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.map.lock().get(key).cloned()
    }

    fn set_raw(&self, key: &str, value: String) {
        self.map.lock().insert(key.to_string(), value);
    }
}
