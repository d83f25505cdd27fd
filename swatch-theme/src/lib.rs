#![warn(missing_docs)]

//! # Swatch Theme Engine
//!
//! Runtime theming for design-system hosts. This crate discovers theme
//! definitions, resolves dependencies between them, loads their assets,
//! caches the results, validates accessibility properties and switches the
//! active theme without ever leaving the host in a broken visual state.
//!
//! ## Overview
//!
//! - **[ThemeRegistry](registry::ThemeRegistry)**: catalog of theme definitions and their dependency graph
//! - **[ThemeCache](cache::ThemeCache)**: LRU cache of loaded stylesheets and theme objects, with TTL
//! - **[ThemeValidator](validator::ThemeValidator)**: palette contrast, typography, spacing and breakpoint checks
//! - **[ThemeEngine](engine::ThemeEngine)**: load/apply/revert lifecycle and events
//! - **[StyleSink](sink::StyleSink)** and **[ThemeStorage](storage::ThemeStorage)**: the host collaborators
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use swatch_theme::prelude::*;
//!
//! let engine = ThemeEngine::new(ThemeEngineConfig::default(), Arc::new(NoopStyleSink));
//! engine.initialize(ThemeCatalog::from_definitions([
//!     ThemeDefinition::stylesheet("ocean", "Ocean"),
//!     ThemeDefinition::programmatic("midnight", "Midnight", ThemeFactory::new(Theme::dark)),
//! ]));
//!
//! engine.on(EventKind::Change, |event| {
//!     if let ThemeEvent::Change(change) = event {
//!         println!("theme is now {}", change.current_theme);
//!     }
//! });
//!
//! futures::executor::block_on(async {
//!     engine.set_theme("ocean", SetThemeOptions::default()).await.unwrap();
//!     // Unknown themes never replace the active one.
//!     engine.set_theme("missing", SetThemeOptions::default()).await.unwrap();
//! });
//! assert_eq!(engine.get_current_theme().as_deref(), Some("ocean"));
//! ```
//!
//! ## Theme Kinds
//!
//! A *stylesheet* theme is an external CSS resource attached by the
//! [StyleSink](sink::StyleSink); applying it only writes the document
//! marker (`data-theme="ocean"`). A *programmatic* theme is a
//! [Theme](theme::Theme) built by a factory; applying it injects the
//! generated CSS custom properties (see [css]) as an inline style block.
//!
//! ## Error Handling
//!
//! Every failure is a [ThemeError](error::ThemeError). With
//! `fallback_on_error` (the default) and a theme already applied, failures
//! are reported through `error` and `revert` events and the call succeeds.

/// Contains the [cache::ThemeCache] LRU cache.
pub mod cache;
/// Contains CSS color parsing and contrast math.
pub mod color;
/// Contains the [config::ThemeEngineConfig] struct for engine configuration.
pub mod config;
/// Contains CSS custom property generation.
pub mod css;
/// Contains the [definition::ThemeDefinition] descriptor.
pub mod definition;
/// Contains the [engine::ThemeEngine] runtime.
pub mod engine;
/// Contains error types for the theme engine.
pub mod error;
/// Contains engine events and the listener bus.
pub mod events;
/// Contains the [registry::ThemeRegistry] catalog.
pub mod registry;
/// Contains the [sink::StyleSink] host trait.
pub mod sink;
/// Contains the [storage::ThemeStorage] persistence trait.
pub mod storage;
/// Contains the [theme::Theme] model.
pub mod theme;
/// Contains the [validator::ThemeValidator].
pub mod validator;

/// Commonly used types.
pub mod prelude {
    pub use crate::cache::{CacheConfig, CacheStats, ThemeCache};
    pub use crate::config::ThemeEngineConfig;
    pub use crate::definition::{ThemeDefinition, ThemeFactory, ThemeKind, ThemeMetadata, ThemeStatus};
    pub use crate::engine::{SetThemeOptions, ThemeEngine, ThemeTarget};
    pub use crate::error::{SinkError, StorageError, ThemeError, ThemeErrorCode, ThemeResult};
    pub use crate::events::{ChangeSource, EventKind, ListenerId, ThemeEvent};
    pub use crate::registry::{ThemeCatalog, ThemeCatalogSource, ThemeRegistry};
    pub use crate::sink::{NoopStyleSink, StyleSink};
    pub use crate::storage::ThemeStorage;
    pub use crate::theme::palette::{Palette, PaletteColor};
    pub use crate::theme::spacing::Spacing;
    pub use crate::theme::Theme;
    pub use crate::validator::{ThemeValidator, ValidationResult};
}
