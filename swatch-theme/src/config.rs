//! # Engine Configuration
//!
//! [ThemeEngineConfig] carries every tunable of the engine: where
//! stylesheets live, how artifacts are named in the host document, cache
//! limits and persistence. Every field has a default, so an empty
//! configuration is valid.
//!
//! ## Sources
//!
//! - **Programmatic**: `ThemeEngineConfig { base_path: "/static/themes".into(), ..Default::default() }`
//! - **TOML**: an `[engine]` table, see [ThemeEngineConfig::from_toml]
//! - **Environment**: [ThemeEngineConfig::from_env_or_default] reads
//!   `SWATCH_THEME_CONFIG` (path to a TOML file) and `SWATCH_THEME`
//!   (default theme id)
//!
//! ```toml
//! [engine]
//! base_path = "/static/themes"
//! use_minified = true
//! default_theme = "dark"
//!
//! [engine.cache]
//! max_size = 4
//! ttl_ms = 600000
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::{ThemeError, ThemeResult};

/// Environment variable holding a path to a TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "SWATCH_THEME_CONFIG";
/// Environment variable overriding the default theme id.
pub const DEFAULT_THEME_ENV: &str = "SWATCH_THEME";

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeEngineConfig {
    /// Directory or URL prefix stylesheet themes are served from.
    pub base_path: String,
    /// Alternative prefix that takes precedence over `base_path`.
    pub cdn_path: Option<String>,
    /// Load `{id}.min.css` instead of `{id}.css`.
    pub use_minified: bool,
    /// Document attribute carrying the active theme marker.
    pub data_attribute: String,
    /// Cache loaded themes.
    pub enable_cache: bool,
    /// Cache limits.
    pub cache: CacheConfig,
    /// Persist the selected theme through the storage collaborator.
    pub enable_persistence: bool,
    /// Key the selected theme is persisted under.
    pub storage_key: String,
    /// Id of the inline style block holding programmatic theme variables.
    pub style_id: String,
    /// Prefix for stylesheet link ids.
    pub link_id_prefix: String,
    /// Prefix for generated CSS custom properties.
    pub css_prefix: String,
    /// Selector generated CSS custom properties are scoped to.
    pub css_selector: String,
    /// Theme applied by `restore_theme` when nothing is persisted.
    pub default_theme: Option<String>,
}

impl Default for ThemeEngineConfig {
    fn default() -> Self {
        Self {
            base_path: "/themes".to_string(),
            cdn_path: None,
            use_minified: false,
            data_attribute: "data-theme".to_string(),
            enable_cache: true,
            cache: CacheConfig::default(),
            enable_persistence: true,
            storage_key: "swatch-theme".to_string(),
            style_id: "swatch-js-theme-styles".to_string(),
            link_id_prefix: "swatch-theme-".to_string(),
            css_prefix: "swatch".to_string(),
            css_selector: ":root".to_string(),
            default_theme: None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    engine: ThemeEngineConfig,
}

impl ThemeEngineConfig {
    /// Load from the environment, falling back to defaults.
    ///
    /// A configuration file named by `SWATCH_THEME_CONFIG` is read first;
    /// `SWATCH_THEME` then overrides the default theme. An unreadable file
    /// is logged and ignored.
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(&path).unwrap_or_else(|err| {
                log::warn!("Ignoring theme configuration {}: {}", path, err);
                Self::default()
            }),
            None => Self::default(),
        };

        if let Some(theme) = lookup(DEFAULT_THEME_ENV).filter(|t| !t.trim().is_empty()) {
            config.default_theme = Some(theme.trim().to_string());
        }

        config
    }

    /// Load from a `.toml` file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ThemeResult<Self> {
        let path = path.as_ref();
        if path.extension().and_then(|s| s.to_str()) != Some("toml") {
            return Err(ThemeError::config_load_failed(format!(
                "unsupported configuration file format {:?}, use .toml",
                path
            )));
        }
        let content = fs::read_to_string(path)
            .map_err(|err| ThemeError::config_load_failed(format!("{}: {}", path.display(), err)))?;
        Self::from_toml(&content)
    }

    /// Parse the `[engine]` table of a TOML document.
    ///
    /// ```rust
    /// use swatch_theme::config::ThemeEngineConfig;
    ///
    /// let config = ThemeEngineConfig::from_toml(r#"
    /// [engine]
    /// base_path = "/static/themes"
    /// "#).unwrap();
    /// assert_eq!(config.base_path, "/static/themes");
    /// assert_eq!(config.data_attribute, "data-theme");
    /// ```
    pub fn from_toml(content: &str) -> ThemeResult<Self> {
        let file: ConfigFile = toml::from_str(content).map_err(ThemeError::config_load_failed)?;
        Ok(file.engine)
    }

    /// Location of the stylesheet for `id` when its definition has no explicit path.
    pub fn stylesheet_path(&self, id: &str) -> String {
        let base = self.cdn_path.as_deref().unwrap_or(&self.base_path);
        let extension = if self.use_minified { "min.css" } else { "css" };
        format!("{}/{}.{}", base.trim_end_matches('/'), id, extension)
    }

    /// Link id used for the stylesheet of `id`.
    pub fn link_id(&self, id: &str) -> String {
        format!("{}{}", self.link_id_prefix, id)
    }
}
