//! # Theme Engine
//!
//! [ThemeEngine] drives the theme lifecycle: it looks themes up in the
//! [ThemeRegistry], loads them (stylesheets through the [StyleSink],
//! programmatic themes through their factory), caches the results, applies
//! exactly one theme at a time and keeps the previous theme active when a
//! switch fails.
//!
//! ## Lifecycle
//!
//! Per theme id the engine moves through `unloaded → loading → loaded →
//! applied`; a failed load parks the id in a failed set until
//! [clear_failed_theme](ThemeEngine::clear_failed_theme) is called or the
//! request is repeated with [SetThemeOptions::force].
//!
//! For a single id at most one load is in flight. Concurrent requests for
//! the same id share it, and only the callers that awaited the load apply
//! the theme afterwards, so a dropped `set_theme` future never applies
//! anything.
//!
//! ## Usage Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use swatch_theme::config::ThemeEngineConfig;
//! use swatch_theme::definition::{ThemeDefinition, ThemeFactory};
//! use swatch_theme::engine::{SetThemeOptions, ThemeEngine};
//! use swatch_theme::registry::ThemeCatalog;
//! use swatch_theme::sink::NoopStyleSink;
//! use swatch_theme::theme::Theme;
//!
//! let engine = ThemeEngine::new(ThemeEngineConfig::default(), Arc::new(NoopStyleSink));
//! engine.initialize(ThemeCatalog::from_definitions([
//!     ThemeDefinition::stylesheet("light", "Light"),
//!     ThemeDefinition::programmatic("dark", "Dark", ThemeFactory::new(Theme::dark)),
//! ]));
//!
//! futures::executor::block_on(async {
//!     engine.set_theme("dark", SetThemeOptions::default()).await.unwrap();
//! });
//! assert_eq!(engine.get_current_theme().as_deref(), Some("dark"));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use indexmap::IndexSet;

use crate::cache::{StylesheetPatch, ThemeCache};
use crate::config::ThemeEngineConfig;
use crate::css::generate_css_variables;
use crate::definition::{ThemeDefinition, ThemeFactory, ThemeKind, ThemeSource};
use crate::error::{ThemeError, ThemeResult};
use crate::events::{
    ChangeSource, EventBus, EventKind, ListenerId, ThemeChangeEvent, ThemeErrorEvent, ThemeEvent, ThemeLoadEvent,
    ThemeRevertEvent,
};
use crate::registry::{ThemeCatalog, ThemeCatalogSource, ThemeRegistry};
use crate::sink::{NoopStyleSink, StyleSink};
use crate::storage::ThemeStorage;
use crate::theme::Theme;
use crate::validator::{ThemeValidator, ValidationResult};

/// Marker and current id used for ad-hoc themes without a name.
pub const CUSTOM_THEME_ID: &str = "custom-theme";

type LoadFuture = Shared<BoxFuture<'static, ThemeResult<()>>>;
type WeakLoadFuture = WeakShared<BoxFuture<'static, ThemeResult<()>>>;

/// What [ThemeEngine::set_theme] should apply.
#[derive(Debug, Clone)]
pub enum ThemeTarget {
    /// A registered theme id.
    Id(String),
    /// A ready-made theme, applied without going through the registry.
    Theme(Box<Theme>),
}

impl From<&str> for ThemeTarget {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for ThemeTarget {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<&String> for ThemeTarget {
    fn from(id: &String) -> Self {
        Self::Id(id.clone())
    }
}

impl From<Theme> for ThemeTarget {
    fn from(theme: Theme) -> Self {
        Self::Theme(Box::new(theme))
    }
}

/// Options for [ThemeEngine::set_theme].
#[derive(Debug, Clone)]
pub struct SetThemeOptions {
    /// Reload even if loaded, and retry a previously failed theme.
    pub force: bool,
    /// Load without applying.
    pub preload: bool,
    /// Remove the previous theme's artifacts when applying.
    pub remove_previous: bool,
    /// Stylesheet location overriding the definition and the configured base path.
    pub custom_path: Option<String>,
    /// Keep the current theme instead of failing, when one is applied.
    pub fallback_on_error: bool,
    /// Reported in the change event.
    pub source: ChangeSource,
}

impl Default for SetThemeOptions {
    fn default() -> Self {
        Self {
            force: false,
            preload: false,
            remove_previous: true,
            custom_path: None,
            fallback_on_error: true,
            source: ChangeSource::User,
        }
    }
}

impl SetThemeOptions {
    /// Reload and retry failed themes.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    /// Load without applying.
    pub fn preload(mut self) -> Self {
        self.preload = true;
        self
    }

    /// Keep the previous theme's artifacts in place.
    pub fn keep_previous(mut self) -> Self {
        self.remove_previous = false;
        self
    }

    /// Load the stylesheet from `path`.
    pub fn with_custom_path(mut self, path: impl Into<String>) -> Self {
        self.custom_path = Some(path.into());
        self
    }

    /// Return errors even when a theme is applied.
    pub fn without_fallback(mut self) -> Self {
        self.fallback_on_error = false;
        self
    }

    /// Report `source` in the change event.
    pub fn with_source(mut self, source: ChangeSource) -> Self {
        self.source = source;
        self
    }
}

#[derive(Default)]
struct EngineState {
    current_theme: Option<String>,
    /// The current theme was applied from a [Theme] object, not the registry.
    current_is_object: bool,
    active_theme: Option<Arc<Theme>>,
    /// Stylesheets attached for the current theme, dependencies first.
    applied_stylesheets: Vec<String>,
    loaded: IndexSet<String>,
    /// In-flight loads. Only callers awaiting a load keep it alive.
    loading: std::collections::HashMap<String, WeakLoadFuture>,
    failed: IndexSet<String>,
}

impl EngineState {
    /// Whether the registered theme `id` is the applied one.
    fn is_applied(&self, id: &str) -> bool {
        !self.current_is_object && self.current_theme.as_deref() == Some(id)
    }

    fn in_flight(&mut self, id: &str) -> Option<LoadFuture> {
        let upgraded = self.loading.get(id).map(WeakShared::upgrade);
        match upgraded {
            Some(Some(load)) => Some(load),
            Some(None) => {
                log::debug!("Discarding abandoned load of theme '{}'", id);
                self.loading.remove(id);
                None
            },
            None => None,
        }
    }

    fn track_load(&mut self, id: &str, load: &LoadFuture) {
        if let Some(weak) = load.downgrade() {
            self.loading.insert(id.to_string(), weak);
        }
    }
}

struct EngineInner {
    config: ThemeEngineConfig,
    registry: RwLock<ThemeRegistry>,
    cache: Mutex<ThemeCache>,
    validator: ThemeValidator,
    sink: Arc<dyn StyleSink>,
    storage: Option<Arc<dyn ThemeStorage>>,
    state: Mutex<EngineState>,
    events: EventBus,
}

/// Builder for [ThemeEngine].
pub struct ThemeEngineBuilder {
    config: ThemeEngineConfig,
    sink: Arc<dyn StyleSink>,
    storage: Option<Arc<dyn ThemeStorage>>,
    validator: ThemeValidator,
}

impl ThemeEngineBuilder {
    /// Use `config`.
    pub fn config(mut self, config: ThemeEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Write styles to `sink`. Defaults to [NoopStyleSink].
    pub fn sink(mut self, sink: Arc<dyn StyleSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Persist the selected theme to `storage`.
    pub fn storage(mut self, storage: Arc<dyn ThemeStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Validate programmatic themes with `validator`.
    pub fn validator(mut self, validator: ThemeValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Create the engine.
    pub fn build(self) -> ThemeEngine {
        let cache = ThemeCache::new(self.config.cache);
        ThemeEngine {
            inner: Arc::new(EngineInner {
                config: self.config,
                registry: RwLock::new(ThemeRegistry::new()),
                cache: Mutex::new(cache),
                validator: self.validator,
                sink: self.sink,
                storage: self.storage,
                state: Mutex::new(EngineState::default()),
                events: EventBus::new(),
            }),
        }
    }
}

/// Runtime theme engine. Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct ThemeEngine {
    inner: Arc<EngineInner>,
}

impl ThemeEngine {
    /// Create an engine writing to `sink`, without persistence.
    pub fn new(config: ThemeEngineConfig, sink: Arc<dyn StyleSink>) -> Self {
        Self::builder().config(config).sink(sink).build()
    }

    /// Start building an engine.
    pub fn builder() -> ThemeEngineBuilder {
        ThemeEngineBuilder {
            config: ThemeEngineConfig::default(),
            sink: Arc::new(NoopStyleSink),
            storage: None,
            validator: ThemeValidator::new(),
        }
    }

    /// Register the themes of `catalog`. Later calls are ignored.
    ///
    /// Dependency problems are logged here and reported again when an
    /// affected theme is requested.
    pub fn initialize(&self, catalog: ThemeCatalog) {
        let mut registry = self.registry_write();
        registry.initialize(catalog.themes, catalog.dependencies);
        for error in registry.validate().errors {
            log::warn!("Theme catalog problem: {}", error);
        }
    }

    /// Register the themes supplied by `source`.
    pub fn initialize_from(&self, source: &dyn ThemeCatalogSource) -> ThemeResult<()> {
        let catalog = source.load_catalog().map_err(|err| ThemeError::config_load_failed(format!("{err:#}")))?;
        self.initialize(catalog);
        Ok(())
    }

    /// Load and apply a theme.
    ///
    /// With [fallback_on_error](SetThemeOptions::fallback_on_error) set and a
    /// theme already applied, a failure emits `error` and `revert` events and
    /// returns `Ok`; otherwise the error is returned.
    pub async fn set_theme(&self, target: impl Into<ThemeTarget>, options: SetThemeOptions) -> ThemeResult<()> {
        match target.into() {
            ThemeTarget::Theme(theme) => {
                self.apply_theme_object(*theme, &options);
                Ok(())
            },
            ThemeTarget::Id(id) => self.set_theme_by_id(id, options).await,
        }
    }

    /// Load a theme without applying it.
    pub async fn preload_theme(&self, id: &str) -> ThemeResult<()> {
        self.set_theme(id, SetThemeOptions::default().preload()).await
    }

    /// Apply the persisted theme, or the configured default.
    ///
    /// Returns the id that was applied, if any.
    pub async fn restore_theme(&self) -> ThemeResult<Option<String>> {
        if let Some(id) = self.stored_theme() {
            let options = SetThemeOptions::default().with_source(ChangeSource::Storage);
            let result = self.set_theme(id.as_str(), options).await;
            match result {
                Ok(()) if self.get_current_theme().as_deref() == Some(id.as_str()) => return Ok(Some(id)),
                Ok(()) => {},
                Err(err) => log::warn!("Could not restore persisted theme '{}': {}", id, err),
            }
        }

        let Some(id) = self.inner.config.default_theme.clone() else {
            return Ok(None);
        };
        let options = SetThemeOptions::default().with_source(ChangeSource::System);
        self.set_theme(id.as_str(), options).await?;
        Ok(Some(id))
    }

    /// Id of the applied theme.
    pub fn get_current_theme(&self) -> Option<String> {
        self.inner.state().current_theme.clone()
    }

    /// The applied theme object, for programmatic and ad-hoc themes.
    pub fn get_active_theme(&self) -> Option<Arc<Theme>> {
        self.inner.state().active_theme.clone()
    }

    /// Whether `id` is loaded.
    pub fn is_theme_loaded(&self, id: &str) -> bool {
        self.inner.state().loaded.contains(id)
    }

    /// Loaded ids, in load order.
    pub fn loaded_themes(&self) -> Vec<String> {
        self.inner.state().loaded.iter().cloned().collect()
    }

    /// Ids whose last load failed.
    pub fn failed_themes(&self) -> Vec<String> {
        self.inner.state().failed.iter().cloned().collect()
    }

    /// Whether the last load of `id` failed.
    pub fn has_failed_theme(&self, id: &str) -> bool {
        self.inner.state().failed.contains(id)
    }

    /// Allow every failed theme to be loaded again.
    pub fn clear_failed_themes(&self) {
        self.inner.state().failed.clear();
    }

    /// Allow `id` to be loaded again. Returns whether it was marked failed.
    pub fn clear_failed_theme(&self, id: &str) -> bool {
        self.inner.state().failed.shift_remove(id)
    }

    /// Subscribe to events of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ThemeEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(kind, Arc::new(listener))
    }

    /// Unsubscribe. Returns whether the listener was registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.events.unsubscribe(kind, id)
    }

    /// The theme registry. Do not hold the guard across an `.await`.
    pub fn registry(&self) -> RwLockReadGuard<'_, ThemeRegistry> {
        self.inner.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// The theme cache. Do not hold the guard across an `.await`.
    pub fn cache(&self) -> MutexGuard<'_, ThemeCache> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The engine configuration.
    pub fn config(&self) -> &ThemeEngineConfig {
        &self.inner.config
    }

    /// The validator applied to programmatic themes.
    pub fn validator(&self) -> &ThemeValidator {
        &self.inner.validator
    }

    async fn set_theme_by_id(&self, id: String, options: SetThemeOptions) -> ThemeResult<()> {
        if !self.registry().has(&id) {
            let err = ThemeError::not_found(&id);
            self.inner.state().failed.insert(id.clone());
            self.emit_error(&id, &err);
            return self.revert_or_error(&id, err, &options, true);
        }

        enum Step {
            Refuse,
            Done,
            Apply,
            Await(LoadFuture),
        }

        let step = {
            let mut state = self.inner.state();
            if !options.force && state.failed.contains(&id) {
                Step::Refuse
            } else if !options.force && state.loaded.contains(&id) {
                if options.preload || state.is_applied(&id) {
                    Step::Done
                } else {
                    Step::Apply
                }
            } else if let Some(load) = state.in_flight(&id) {
                log::debug!("Joining in-flight load of theme '{}'", id);
                Step::Await(load)
            } else {
                let load = self.spawn_load(&id, options.custom_path.clone(), true);
                state.track_load(&id, &load);
                Step::Await(load)
            }
        };

        match step {
            Step::Refuse => {
                let err = ThemeError::previously_failed(&id);
                self.emit_error(&id, &err);
                self.revert_or_error(&id, err, &options, true)
            },
            Step::Done => Ok(()),
            Step::Apply => self.apply_or_fail(&id, &options),
            Step::Await(load) => match load.await {
                Ok(()) => {
                    let is_current = self.inner.state().is_applied(&id);
                    if options.preload || (is_current && !options.force) {
                        Ok(())
                    } else {
                        self.apply_or_fail(&id, &options)
                    }
                },
                Err(err) => self.fail(&id, err, &options),
            },
        }
    }

    fn apply_or_fail(&self, id: &str, options: &SetThemeOptions) -> ThemeResult<()> {
        match self.apply(id, options) {
            Ok(()) => Ok(()),
            Err(err) => self.fail(id, err, options),
        }
    }

    /// Record a failure for `id`. Only the first failure, or a forced one, notifies listeners.
    fn fail(&self, id: &str, err: ThemeError, options: &SetThemeOptions) -> ThemeResult<()> {
        let newly_failed = self.inner.state().failed.insert(id.to_string());
        let notify = newly_failed || options.force;
        log::warn!("{}", err);
        if notify {
            self.emit_error(id, &err);
        }
        self.revert_or_error(id, err, options, notify)
    }

    fn revert_or_error(&self, id: &str, err: ThemeError, options: &SetThemeOptions, notify: bool) -> ThemeResult<()> {
        let current = self.get_current_theme();
        match current {
            Some(current) if options.fallback_on_error => {
                log::warn!("Keeping theme '{}' after '{}' failed", current, id);
                if notify {
                    self.emit(ThemeEvent::Revert(ThemeRevertEvent {
                        attempted: id.to_string(),
                        reverted_to: current,
                        error: err,
                    }));
                }
                Ok(())
            },
            _ => Err(err),
        }
    }

    fn spawn_load(&self, id: &str, custom_path: Option<String>, with_dependencies: bool) -> LoadFuture {
        let engine = self.clone();
        let id = id.to_string();
        async move {
            let result = if with_dependencies {
                engine.load_with_dependencies(&id, custom_path.as_deref()).await
            } else {
                engine.load_one(&id, custom_path.as_deref()).await
            };

            {
                let mut state = engine.inner.state();
                state.loading.remove(&id);
                if result.is_ok() {
                    state.loaded.insert(id.clone());
                    state.failed.shift_remove(&id);
                }
            }

            if result.is_ok() {
                engine.registry_write().mark_loaded(&id, None);
                log::debug!("Loaded theme '{}'", id);
                engine.emit(ThemeEvent::Load(ThemeLoadEvent {
                    theme_id: id.clone(),
                    timestamp: SystemTime::now(),
                }));
            }
            result
        }
        .boxed()
        .shared()
    }

    async fn load_with_dependencies(&self, id: &str, custom_path: Option<&str>) -> ThemeResult<()> {
        let order = self.registry().resolve_dependency_order(id)?;
        for dependency in order.iter().filter(|dep| dep.as_str() != id) {
            if let Err(err) = self.ensure_dependency(dependency).await {
                return Err(ThemeError::load_failed(id, format!("dependency '{dependency}' failed: {err}")));
            }
        }
        self.load_one(id, custom_path).await
    }

    async fn ensure_dependency(&self, id: &str) -> ThemeResult<()> {
        let load = {
            let mut state = self.inner.state();
            if state.loaded.contains(id) {
                return Ok(());
            }
            match state.in_flight(id) {
                Some(load) => load,
                None => {
                    let load = self.spawn_load(id, None, false);
                    state.track_load(id, &load);
                    load
                },
            }
        };

        let result = load.await;
        if result.is_err() {
            self.inner.state().failed.insert(id.to_string());
        }
        result
    }

    async fn load_one(&self, id: &str, custom_path: Option<&str>) -> ThemeResult<()> {
        let definition = self
            .registry()
            .get_definition(id)
            .cloned()
            .ok_or_else(|| ThemeError::not_found(id))?;

        match &definition.source {
            ThemeSource::Stylesheet { css_path } => {
                let path = custom_path
                    .or(css_path.as_deref())
                    .map(str::to_string)
                    .unwrap_or_else(|| self.inner.config.stylesheet_path(id));
                self.load_stylesheet(id, &path).await
            },
            ThemeSource::Programmatic(factory) => self.load_programmatic(id, &definition, factory).await,
        }
    }

    async fn load_stylesheet(&self, id: &str, path: &str) -> ThemeResult<()> {
        let use_cache = self.inner.config.enable_cache;
        if use_cache {
            let mut cache = self.cache();
            if cache.get_css(id).is_some_and(|state| state.loaded) {
                log::debug!("Theme '{}' stylesheet served from cache", id);
                return Ok(());
            }
            cache.set_css(id, StylesheetPatch::loading());
        }

        let link_id = self.inner.config.link_id(id);
        let result = self.inner.sink.load_stylesheet(path, &link_id).await;

        match result {
            Ok(()) => {
                if use_cache {
                    self.cache().set_css(id, StylesheetPatch::loaded());
                }
                Ok(())
            },
            Err(err) => {
                if use_cache {
                    self.cache().delete(id);
                }
                Err(ThemeError::load_failed(id, err))
            },
        }
    }

    async fn load_programmatic(&self, id: &str, definition: &ThemeDefinition, factory: &ThemeFactory) -> ThemeResult<()> {
        let use_cache = self.inner.config.enable_cache;
        if use_cache {
            let cached = self.cache().get_js(id);
            if let Some(theme) = cached {
                log::debug!("Theme '{}' served from cache", id);
                self.registry_write().mark_loaded(id, Some(theme));
                return Ok(());
            }
        }

        let theme = factory
            .create()
            .await
            .map_err(|err| ThemeError::load_failed(id, format!("{err:#}")))?;

        let validation = self.inner.validator.validate(&theme, Some(&definition.metadata));
        log_validation(id, &validation);

        let theme = Arc::new(theme);
        if use_cache {
            self.cache().set_js(id, Arc::clone(&theme));
        }
        self.registry_write().mark_loaded(id, Some(theme));
        Ok(())
    }

    fn apply(&self, id: &str, options: &SetThemeOptions) -> ThemeResult<()> {
        let (definition, registered_theme, keep, stylesheets) = {
            let registry = self.registry();
            let definition = registry
                .get_definition(id)
                .cloned()
                .ok_or_else(|| ThemeError::not_found(id))?;
            let keep = registry
                .resolve_dependency_order(id)
                .unwrap_or_else(|_| vec![id.to_string()]);
            let stylesheets: Vec<String> = keep
                .iter()
                .filter(|dep| {
                    registry
                        .get_definition(dep)
                        .is_some_and(|d| d.kind() == ThemeKind::Stylesheet)
                })
                .cloned()
                .collect();
            (definition, registry.get_theme(id), keep, stylesheets)
        };
        let config = &self.inner.config;

        let theme = match definition.kind() {
            ThemeKind::Stylesheet => None,
            ThemeKind::Programmatic => {
                let theme = match registered_theme {
                    Some(theme) => theme,
                    None => self
                        .cache()
                        .get_js(id)
                        .ok_or_else(|| ThemeError::load_failed(id, "theme object is not available"))?,
                };
                let css = generate_css_variables(&theme, &config.css_selector, &config.css_prefix);
                Some((theme, css))
            },
        };

        if options.remove_previous {
            self.remove_previous_artifacts(Some(id), &keep);
        }

        let active = match theme {
            Some((theme, css)) => {
                self.inner.sink.inject_inline_style(&css, &config.style_id);
                Some(theme)
            },
            None => None,
        };
        self.inner.sink.set_theme_marker(&config.data_attribute, definition.marker());

        let previous = {
            let mut state = self.inner.state();
            state.active_theme = active.clone();
            let mut applied: Vec<String> = std::mem::take(&mut state.applied_stylesheets)
                .into_iter()
                .filter(|previous| !stylesheets.contains(previous))
                .collect();
            applied.extend(stylesheets);
            state.applied_stylesheets = applied;
            state.current_is_object = false;
            state.current_theme.replace(id.to_string())
        };

        self.persist(id);
        log::info!("Applied theme '{}'", id);
        self.emit(ThemeEvent::Change(ThemeChangeEvent {
            previous_theme: previous,
            current_theme: id.to_string(),
            theme_object: active,
            timestamp: SystemTime::now(),
            source: options.source,
        }));
        Ok(())
    }

    fn apply_theme_object(&self, theme: Theme, options: &SetThemeOptions) {
        let id = theme
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| CUSTOM_THEME_ID.to_string());

        let validation = self.inner.validator.validate(&theme, None);
        log_validation(&id, &validation);

        let config = &self.inner.config;
        let css = generate_css_variables(&theme, &config.css_selector, &config.css_prefix);
        if options.remove_previous {
            self.remove_previous_artifacts(None, &[]);
        }
        self.inner.sink.inject_inline_style(&css, &config.style_id);
        self.inner.sink.set_theme_marker(&config.data_attribute, &id);

        let theme = Arc::new(theme);
        let previous = {
            let mut state = self.inner.state();
            state.active_theme = Some(Arc::clone(&theme));
            state.current_is_object = true;
            state.current_theme.replace(id.clone())
        };

        log::info!("Applied theme object '{}'", id);
        self.emit(ThemeEvent::Change(ThemeChangeEvent {
            previous_theme: previous,
            current_theme: id,
            theme_object: Some(theme),
            timestamp: SystemTime::now(),
            source: options.source,
        }));
    }

    /// Detach the current theme's artifacts unless the registered theme
    /// `next` is already applied. Stylesheets listed in `keep` stay attached.
    fn remove_previous_artifacts(&self, next: Option<&str>, keep: &[String]) {
        let (detached, inline) = {
            let mut state = self.inner.state();
            if next.is_some_and(|next| state.is_applied(next)) {
                return;
            }
            let (kept, detached): (Vec<String>, Vec<String>) = std::mem::take(&mut state.applied_stylesheets)
                .into_iter()
                .partition(|applied| keep.contains(applied));
            state.applied_stylesheets = kept;
            for previous in &detached {
                state.loaded.shift_remove(previous);
            }
            (detached, state.active_theme.is_some())
        };

        let config = &self.inner.config;
        for previous in detached {
            log::debug!("Detaching stylesheet of theme '{}'", previous);
            self.inner.sink.remove_stylesheet(&config.link_id(&previous));
            self.cache().delete(&previous);
            self.registry_write().mark_unloaded(&previous);
        }
        if inline {
            self.inner.sink.remove_inline_style(&config.style_id);
        }
    }

    fn stored_theme(&self) -> Option<String> {
        let storage = self.persistent_storage()?;
        let stored = match storage.get(&self.inner.config.storage_key) {
            Ok(stored) => stored?,
            Err(err) => {
                log::warn!("Could not read persisted theme: {}", err);
                return None;
            },
        };
        if self.registry().has(&stored) {
            Some(stored)
        } else {
            log::debug!("Persisted theme '{}' is not registered", stored);
            None
        }
    }

    fn persist(&self, id: &str) {
        if let Some(storage) = self.persistent_storage() {
            if let Err(err) = storage.set(&self.inner.config.storage_key, id) {
                log::warn!("Could not persist theme '{}': {}", id, err);
            }
        }
    }

    fn persistent_storage(&self) -> Option<&Arc<dyn ThemeStorage>> {
        if !self.inner.config.enable_persistence {
            return None;
        }
        self.inner.storage.as_ref().filter(|storage| storage.is_available())
    }

    fn emit_error(&self, id: &str, err: &ThemeError) {
        self.emit(ThemeEvent::Error(ThemeErrorEvent {
            theme_id: id.to_string(),
            error: err.clone(),
        }));
    }

    fn emit(&self, event: ThemeEvent) {
        self.inner.events.emit(&event);
    }

    fn registry_write(&self) -> RwLockWriteGuard<'_, ThemeRegistry> {
        self.inner.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EngineInner {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_validation(id: &str, validation: &ValidationResult) {
    for error in &validation.errors {
        log::warn!("Theme '{}' validation error: {}", id, error);
    }
    for warning in &validation.warnings {
        log::warn!("Theme '{}' validation warning: {}", id, warning);
    }
}
