//! Key/value persistence for the profile store

use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::config::document::write_atomic;
use crate::error::{ConfigError, ConfigResult};

/// Raw string key/value persistence
///
/// The profile engine persists the whole `ProfileStore` as one value; the
/// trait keeps the storage medium swappable.
pub trait KvStore {
    /// Fetch a value, `None` if the key was never set
    fn get(&self, key: &str) -> ConfigResult<Option<String>>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> ConfigResult<()>;
}

/// KvStore backed by a single JSON object file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_map(&self) -> ConfigResult<serde_json::Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(serde_json::Map::new())
            }
            Err(e) => return Err(ConfigError::io(&self.path, &e)),
        };
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::StoreCorrupt(e.to_string()))?;
        value
            .as_object()
            .cloned()
            .ok_or_else(|| ConfigError::StoreCorrupt("store root is not an object".into()))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        let map = self.load_map()?;
        match map.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ConfigError::StoreCorrupt(format!(
                "value for '{key}' is not a string"
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        let mut map = self.load_map()?;
        map.insert(key.to_string(), Value::String(value.to_string()));
        let content = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| ConfigError::Internal(e.to_string()))?;
        write_atomic(&self.path, &content)
    }
}
