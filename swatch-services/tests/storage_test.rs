use std::fs;
use std::sync::Arc;

use swatch_services::{FileStorage, MemoryStorage};
use swatch_theme::prelude::*;

#[tokio::test]
async fn test_file_storage_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::with_path(dir.path().join("state.toml")).unwrap();

    assert!(storage.is_available());
    assert_eq!(storage.get("swatch-theme").unwrap(), None);
}

#[tokio::test]
async fn test_file_storage_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("state.toml");

    let storage = FileStorage::with_path(&path).unwrap();
    storage.set("swatch-theme", "ocean").unwrap();
    assert!(path.exists());

    let reopened = FileStorage::with_path(&path).unwrap();
    assert_eq!(reopened.get("swatch-theme").unwrap().as_deref(), Some("ocean"));

    reopened.remove("swatch-theme").unwrap();
    let reopened = FileStorage::with_path(&path).unwrap();
    assert_eq!(reopened.get("swatch-theme").unwrap(), None);
}

#[tokio::test]
async fn test_file_storage_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.toml");
    fs::write(&path, "this is = = not toml").unwrap();

    let err = FileStorage::with_path(&path).unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn test_engine_restores_from_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.toml");
    let catalog = ThemeCatalog::from_definitions([
        ThemeDefinition::stylesheet("light", "Light"),
        ThemeDefinition::stylesheet("dark", "Dark"),
    ]);

    let engine = ThemeEngine::builder()
        .storage(Arc::new(FileStorage::with_path(&path).unwrap()))
        .build();
    engine.initialize(catalog.clone());
    engine.set_theme("dark", SetThemeOptions::default()).await.unwrap();

    let restarted = ThemeEngine::builder()
        .storage(Arc::new(FileStorage::with_path(&path).unwrap()))
        .build();
    restarted.initialize(catalog);
    assert_eq!(restarted.restore_theme().await.unwrap().as_deref(), Some("dark"));
}

#[tokio::test]
async fn test_memory_storage_with_engine() {
    let storage = Arc::new(MemoryStorage::new());
    let engine = ThemeEngine::builder().storage(storage.clone()).build();
    engine.initialize(ThemeCatalog::from_definitions([ThemeDefinition::stylesheet("dark", "Dark")]));

    engine.set_theme("dark", SetThemeOptions::default()).await.unwrap();
    assert_eq!(storage.get("swatch-theme").unwrap().as_deref(), Some("dark"));
}
