#[cfg(test)]
#[path = "key_value_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path;

use dashmap::DashMap;

use crate::domain::models::StoreResult;

/// Synchronous string slots scoped to one user profile.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove(&self, key: &str) -> StoreResult<()>;
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: DashMap<String, String>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        return self.values.get(key).map(|e| return e.value().to_string());
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        return Ok(());
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.values.remove(key);
        return Ok(());
    }
}

/// Slots kept in memory and written through to a single JSON object file.
pub struct FileKeyValueStore {
    file_path: path::PathBuf,
    values: DashMap<String, String>,
}

impl FileKeyValueStore {
    /// Opens the file, starting empty when it is missing or unreadable.
    pub fn open(file_path: path::PathBuf) -> FileKeyValueStore {
        let values = DashMap::new();
        if let Ok(payload) = fs::read_to_string(&file_path) {
            match serde_json::from_str::<BTreeMap<String, String>>(&payload) {
                Ok(map) => {
                    for (key, value) in map {
                        values.insert(key, value);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = ?err, path = ?file_path, "Storage file is corrupt, starting empty");
                }
            }
        }

        return FileKeyValueStore { file_path, values };
    }

    fn flush(&self) -> StoreResult<()> {
        let snapshot = self
            .values
            .iter()
            .map(|e| return (e.key().to_string(), e.value().to_string()))
            .collect::<BTreeMap<String, String>>();
        let payload = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.file_path.with_extension("json.tmp");
        fs::write(&temp_path, payload)?;
        fs::rename(&temp_path, &self.file_path)?;

        return Ok(());
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        return self.values.get(key).map(|e| return e.value().to_string());
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        return self.flush();
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.values.remove(key);
        return self.flush();
    }
}

pub type KeyValueBox = std::sync::Arc<dyn KeyValueStore + Send + Sync>;

/// Reads a JSON collection from a slot. Missing or corrupt data reads as an
/// empty collection.
pub fn read_collection<T: serde::de::DeserializeOwned>(kv: &KeyValueBox, key: &str) -> Vec<T> {
    let payload = match kv.get(key) {
        Some(payload) => payload,
        None => return vec![],
    };

    match serde_json::from_str::<Vec<T>>(&payload) {
        Ok(items) => return items,
        Err(err) => {
            tracing::warn!(error = ?err, key = key, "Stored collection is corrupt, reading as empty");
            return vec![];
        }
    }
}

pub fn write_collection<T: serde::Serialize>(
    kv: &KeyValueBox,
    key: &str,
    items: &[T],
) -> StoreResult<()> {
    let payload = serde_json::to_string(items)?;
    return kv.set(key, &payload);
}

/// Writes a scalar slot, clearing it for `None`.
pub fn set_scalar(kv: &KeyValueBox, key: &str, value: Option<&str>) -> StoreResult<()> {
    match value {
        Some(value) => return kv.set(key, value),
        None => return kv.remove(key),
    }
}
