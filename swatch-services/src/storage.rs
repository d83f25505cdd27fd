// SPDX-License-Identifier: LGPL-3.0-only
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use swatch_theme::error::StorageError;
use swatch_theme::storage::ThemeStorage;

/// Process-local theme storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ThemeStorage for MemoryStorage {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

/// Theme storage backed by a TOML file of string values.
///
/// The file is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage at the default location, `~/.config/swatch/state.toml`.
    pub fn new() -> Result<Self, StorageError> {
        let path = Self::default_path().ok_or(StorageError::Unavailable)?;
        Self::with_path(path)
    }

    /// Open the storage at `path`. A missing file is treated as empty.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| StorageError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default location of the storage file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .map(|dir| dir.join("swatch").join("state.toml"))
    }

    /// The file this storage writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn values(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(values).map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ThemeStorage for FileStorage {
    fn is_available(&self) -> bool {
        match self.path.parent() {
            Some(parent) => !parent.exists() || parent.is_dir(),
            None => false,
        }
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values();
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values();
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.save(&values)
    }
}
