//! LRU cache for loaded theme assets.
//!
//! Stylesheet themes are cached as load markers, programmatic themes as the
//! materialized [Theme]. Every read or write moves an id to the
//! most-recently-used end; eviction happens right before a new id is
//! inserted. Entries older than the configured TTL are dropped on access.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of ids kept before the least recently used one is evicted.
    pub max_size: usize,
    /// Entry lifetime in milliseconds, `0` disables expiry.
    pub ttl_ms: u64,
    /// A disabled cache misses every read and ignores writes.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            ttl_ms: 0,
            enabled: true,
        }
    }
}

/// Cached state of a stylesheet theme.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesheetState {
    /// The stylesheet is attached.
    pub loaded: bool,
    /// A load is in flight.
    pub loading: bool,
    /// Stylesheet text, when the sink provides it.
    pub css_content: Option<String>,
}

/// Partial update merged into a [StylesheetState] by [ThemeCache::set_css].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StylesheetPatch {
    /// New `loaded` flag.
    pub loaded: Option<bool>,
    /// New `loading` flag.
    pub loading: Option<bool>,
    /// New stylesheet text.
    pub css_content: Option<String>,
}

impl StylesheetPatch {
    /// Marks a load as in flight.
    pub fn loading() -> Self {
        Self {
            loaded: Some(false),
            loading: Some(true),
            css_content: None,
        }
    }

    /// Marks a load as finished.
    pub fn loaded() -> Self {
        Self {
            loaded: Some(true),
            loading: Some(false),
            css_content: None,
        }
    }
}

#[derive(Debug, Clone)]
enum CachedAsset {
    Stylesheet(StylesheetState),
    Programmatic(Arc<Theme>),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    asset: CachedAsset,
    timestamp: Instant,
}

/// Snapshot returned by [ThemeCache::stats].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached ids.
    pub size: usize,
    /// Configured capacity.
    pub max_size: usize,
    /// Stylesheet entries.
    pub css_themes: usize,
    /// Programmatic entries.
    pub js_themes: usize,
}

/// LRU cache with optional TTL, keyed by theme id.
pub struct ThemeCache {
    entries: LruCache<String, CacheEntry>,
    config: CacheConfig,
}

impl ThemeCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: LruCache::unbounded(),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Read a stylesheet entry.
    pub fn get_css(&mut self, id: &str) -> Option<StylesheetState> {
        match self.get_fresh(id)? {
            CachedAsset::Stylesheet(state) => Some(state.clone()),
            CachedAsset::Programmatic(_) => None,
        }
    }

    /// Read a programmatic entry.
    pub fn get_js(&mut self, id: &str) -> Option<Arc<Theme>> {
        match self.get_fresh(id)? {
            CachedAsset::Programmatic(theme) => Some(Arc::clone(theme)),
            CachedAsset::Stylesheet(_) => None,
        }
    }

    /// Merge `patch` into the stylesheet entry for `id`, creating it if needed.
    pub fn set_css(&mut self, id: &str, patch: StylesheetPatch) {
        if !self.config.enabled {
            return;
        }

        let mut state = match self.entries.pop(id) {
            Some(CacheEntry {
                asset: CachedAsset::Stylesheet(state),
                ..
            }) => state,
            Some(_) => StylesheetState::default(),
            None => {
                self.evict_for_insert();
                StylesheetState::default()
            },
        };

        if let Some(loaded) = patch.loaded {
            state.loaded = loaded;
        }
        if let Some(loading) = patch.loading {
            state.loading = loading;
        }
        if patch.css_content.is_some() {
            state.css_content = patch.css_content;
        }

        self.entries.push(
            id.to_string(),
            CacheEntry {
                asset: CachedAsset::Stylesheet(state),
                timestamp: Instant::now(),
            },
        );
    }

    /// Store a materialized theme.
    pub fn set_js(&mut self, id: &str, theme: Arc<Theme>) {
        if !self.config.enabled {
            return;
        }
        if !self.entries.contains(id) {
            self.evict_for_insert();
        }
        self.entries.push(
            id.to_string(),
            CacheEntry {
                asset: CachedAsset::Programmatic(theme),
                timestamp: Instant::now(),
            },
        );
    }

    /// Whether a fresh entry exists. Does not change recency.
    pub fn has(&mut self, id: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        let expired = match self.entries.peek(id) {
            Some(entry) => self.is_expired(entry),
            None => return false,
        };
        if expired {
            self.entries.pop(id);
        }
        !expired
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&mut self, id: &str) -> bool {
        self.entries.pop(id).is_some()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Current size and composition.
    pub fn stats(&self) -> CacheStats {
        let css_themes = self
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry.asset, CachedAsset::Stylesheet(_)))
            .count();
        CacheStats {
            size: self.entries.len(),
            max_size: self.config.max_size,
            css_themes,
            js_themes: self.entries.len() - css_themes,
        }
    }

    /// Number of cached ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_fresh(&mut self, id: &str) -> Option<&CachedAsset> {
        if !self.config.enabled {
            return None;
        }
        let expired = self.is_expired(self.entries.peek(id)?);
        if expired {
            log::debug!("Theme cache entry '{}' expired", id);
            self.entries.pop(id);
            return None;
        }
        self.entries.get(id).map(|entry| &entry.asset)
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.config.ttl_ms > 0 && entry.timestamp.elapsed() > Duration::from_millis(self.config.ttl_ms)
    }

    fn evict_for_insert(&mut self) {
        while self.entries.len() >= self.config.max_size {
            match self.entries.pop_lru() {
                Some((id, _)) => log::debug!("Evicted theme '{}' from cache", id),
                None => break,
            }
        }
    }
}

impl Default for ThemeCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
