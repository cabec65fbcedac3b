//! Persistent key-value store backing the headline cache.
//!
//! The store holds JSON values under string keys. Besides the cache keys it
//! may hold unrelated keys written by the desktop shell (window bounds,
//! auto-launch flag); those are carried through untouched on every write.
//!
//! # Atomicity
//!
//! [`KeyValueStore::set_many`] writes all given entries in one step. The file
//! store stages the whole new snapshot in a uniquely named sibling temp file
//! and renames it over the old one, so a reader sees either the previous
//! snapshot or the new one, never a mix. This holds across processes sharing
//! the file (a `get` run next to the daemon); the last rename wins.

use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// The value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Several values read from one consistent snapshot.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.get(key).await?);
        }
        Ok(values)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), value)]).await
    }

    /// Write every entry in one atomic step.
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;
}

/// A store persisted as one JSON object in a single file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serialises read-modify-write cycles within the process
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file missing; starting empty");
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Corrupt(format!("top-level {}", json_kind(&other)))),
        }
    }
}

/// Stage `json` in a uniquely named sibling file, flush it, then rename it
/// over `path`. Concurrent writers, in this process or another, never share a
/// staging file.
fn write_snapshot(path: &Path, json: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(json)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|e| {
        warn!(error = %e.error, "Failed to move staged store file into place");
        StoreError::Io(e.error)
    })?;
    Ok(())
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut map = self.load().await?;
        Ok(map.remove(key))
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        let mut map = self.load().await?;
        Ok(keys.iter().map(|k| map.remove(*k)).collect())
    }

    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), keys = entries.len()))]
    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.load().await?;
        for (key, value) in entries {
            map.insert(key, value);
        }
        let json = serde_json::to_vec_pretty(&Value::Object(map))?;
        let bytes = json.len();

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &json))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;
        debug!(bytes, "Store snapshot written");
        Ok(())
    }
}

/// An in-process store, used for ephemeral runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>, StoreError> {
        let values = self.values.lock().await;
        Ok(keys.iter().map(|k| values.get(*k).cloned()).collect())
    }

    async fn set_many(&self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        values.extend(entries);
        Ok(())
    }
}
