// SPDX-License-Identifier: LGPL-3.0-only
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use smol::fs;
use std::path::{Path, PathBuf};
use swatch_theme::config::ThemeEngineConfig;
use swatch_theme::definition::{ThemeDefinition, ThemeMetadata};
use swatch_theme::registry::{ThemeCatalog, ThemeCatalogSource};
use xdg::BaseDirectories;

const SETTINGS_FILE: &str = "engine.toml";

/// A stylesheet theme declared in a settings file.
///
/// ```toml
/// [themes.ocean]
/// display_name = "Ocean"
/// css_path = "/static/ocean.css"
/// dependencies = ["base"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeEntry {
    /// Human readable name. Defaults to the id.
    pub display_name: Option<String>,
    /// Explicit stylesheet path.
    pub css_path: Option<String>,
    /// Ids this theme depends on.
    pub dependencies: Vec<String>,
    /// Marker value written instead of the id.
    pub class: Option<String>,
    /// Descriptive metadata.
    pub metadata: ThemeMetadata,
}

impl ThemeEntry {
    fn to_definition(&self, id: &str) -> ThemeDefinition {
        let mut definition = ThemeDefinition::stylesheet(id, self.display_name.as_deref().unwrap_or(id))
            .with_dependencies(self.dependencies.iter().cloned())
            .with_metadata(self.metadata.clone());
        if let Some(path) = &self.css_path {
            definition = definition.with_css_path(path);
        }
        if let Some(class) = &self.class {
            definition = definition.with_class(class);
        }
        definition
    }
}

/// One parsed settings file.
#[derive(Debug, Clone, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    engine: toml::Table,
    #[serde(default)]
    themes: IndexMap<String, ThemeEntry>,
}

/// Registry for the engine settings and theme catalog of a host.
///
/// Files are layered: later files override single keys of `[engine]` and
/// whole entries of `[themes]`.
#[derive(Debug, Clone, Default)]
pub struct SettingsRegistry {
    engine: toml::Table,
    themes: IndexMap<String, ThemeEntry>,
}

impl SettingsRegistry {
    /// Create a new SettingsRegistry and load settings from standard locations.
    pub async fn new() -> Result<Self> {
        let mut registry = Self::default();
        registry.load().await?;
        Ok(registry)
    }

    /// Load settings from standard locations in precedence order.
    ///
    /// Order (later overrides earlier):
    /// 1. System Data: /usr/share/swatch/engine.toml (and XDG_DATA_DIRS)
    /// 2. System Config: /etc/xdg/swatch/engine.toml (and XDG_CONFIG_DIRS)
    /// 3. User Config: ~/.config/swatch/engine.toml (XDG_CONFIG_HOME)
    pub async fn load(&mut self) -> Result<()> {
        let xdg_dirs = BaseDirectories::with_prefix("swatch")?;

        for path in xdg_dirs.find_data_files(SETTINGS_FILE).rev() {
            self.load_file(&path).await;
        }

        for path in xdg_dirs.find_config_files(SETTINGS_FILE).rev() {
            self.load_file(&path).await;
        }

        let user_config_path = xdg_dirs.get_config_home().join(SETTINGS_FILE);
        if user_config_path.exists() {
            self.load_file(&user_config_path).await;
        }

        Ok(())
    }

    async fn load_file(&mut self, path: &Path) {
        log::info!("Loading settings from: {:?}", path);
        match fs::read_to_string(path).await {
            Ok(content) => {
                if let Err(e) = self.merge_toml(&content) {
                    log::warn!("Failed to parse settings file {:?}: {:#}", path, e);
                }
            },
            Err(e) => {
                log::warn!("Failed to read settings file {:?}: {}", path, e);
            },
        }
    }

    /// Load settings from custom paths, in order. Returns one result per path.
    pub async fn load_from_paths_async(&mut self, paths: Vec<PathBuf>) -> Vec<Result<()>> {
        let mut results = Vec::new();

        for path in paths {
            let result = async {
                let content = fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read settings file {:?}", path))?;
                self.merge_toml(&content)
                    .with_context(|| format!("Failed to parse settings file {:?}", path))
            }
            .await;

            results.push(result);
        }

        results
    }

    /// Parse a settings document and layer it over the current settings.
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let file: SettingsFile = toml::from_str(content)?;
        merge_tables(&mut self.engine, file.engine);
        self.themes.extend(file.themes);
        Ok(())
    }

    /// Reload settings (re-runs the full load process).
    pub async fn reload_async(&mut self) -> Result<()> {
        *self = Self::default();
        self.load().await
    }

    /// The merged engine configuration.
    pub fn engine_config(&self) -> Result<ThemeEngineConfig> {
        let config = toml::Value::Table(self.engine.clone())
            .try_into::<ThemeEngineConfig>()
            .context("Invalid [engine] settings")?;
        Ok(config)
    }

    /// The declared themes, in declaration order.
    pub fn themes(&self) -> &IndexMap<String, ThemeEntry> {
        &self.themes
    }
}

impl ThemeCatalogSource for SettingsRegistry {
    fn load_catalog(&self) -> Result<ThemeCatalog> {
        Ok(ThemeCatalog::from_definitions(
            self.themes.iter().map(|(id, entry)| entry.to_definition(id)),
        ))
    }
}

/// Recursively merge `overlay` into `base`. Nested tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            },
            (_, value) => {
                base.insert(key, value);
            },
        }
    }
}
