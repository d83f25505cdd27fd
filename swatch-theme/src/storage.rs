//! Persistence of the user's theme choice.

use crate::error::StorageError;

/// Key/value persistence for the selected theme id.
pub trait ThemeStorage: Send + Sync {
    /// Whether the store can be used in the current environment.
    fn is_available(&self) -> bool;

    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
