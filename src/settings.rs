/// Persisted settings
///
/// Float key/value storage for the master volumes. The pool only needs
/// `get_float`/`set_float`/`save`; where the values end up is up to the store.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ConfigError;

/// Minimal float settings storage
pub trait SettingsStore {
    fn get_float(&self, key: &str) -> Option<f32>;

    fn set_float(&mut self, key: &str, value: f32);

    /// Flush pending changes to durable storage
    fn save(&mut self) -> Result<(), ConfigError>;
}

/// Settings kept in a JSON file
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, f32>,
}

impl JsonSettingsStore {
    /// Open the store at `path`; a missing file starts empty
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
            let values: BTreeMap<String, f32> =
                serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })?;
            tracing::info!("Loaded {} settings from {}", values.len(), path.display());
            values
        } else {
            tracing::debug!("No settings at {}, starting fresh", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    /// Default location in the user config directory
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("SoundPool").join("settings.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get_float(&self, key: &str) -> Option<f32> {
        self.values.get(key).copied()
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::SaveFailed {
                path: self.path.display().to_string(),
                source,
            }
        };
        let json = serde_json::to_string_pretty(&self.values).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(&self.path, json).map_err(|e| save_failed(Box::new(e)))?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: BTreeMap<String, f32>,
    saves: usize,
}

/// In-memory settings; clones share the same values
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value
    pub fn with_value(self, key: &str, value: f32) -> Self {
        self.inner.lock().values.insert(key.to_string(), value);
        self
    }

    /// Number of times `save` has been called
    pub fn saves(&self) -> usize {
        self.inner.lock().saves
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_float(&self, key: &str) -> Option<f32> {
        self.inner.lock().values.get(key).copied()
    }

    fn set_float(&mut self, key: &str, value: f32) {
        self.inner.lock().values.insert(key.to_string(), value);
    }

    fn save(&mut self) -> Result<(), ConfigError> {
        self.inner.lock().saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_shares_values() {
        let store = MemorySettingsStore::new().with_value("SFXVolume", 0.4);
        let mut handle = store.clone();
        handle.set_float("BGMVolume", 0.9);
        handle.save().unwrap();

        assert_eq!(store.get_float("SFXVolume"), Some(0.4));
        assert_eq!(store.get_float("BGMVolume"), Some(0.9));
        assert_eq!(store.get_float("Missing"), None);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_json_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(store.get_float("SFXVolume"), None);
        store.set_float("SFXVolume", 0.25);
        store.save().unwrap();

        let reopened = JsonSettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get_float("SFXVolume"), Some(0.25));
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let result = JsonSettingsStore::open(&path);
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
    }
}
