//! # Theme Registry
//!
//! The registry is the catalog of every theme the engine knows about. It is
//! filled once from a [ThemeCatalog], keeps the dependency graph between
//! themes in both directions, and resolves a deterministic load order for
//! any theme with its dependencies first.
//!
//! ```rust
//! use swatch_theme::definition::ThemeDefinition;
//! use swatch_theme::registry::{ThemeCatalog, ThemeRegistry};
//!
//! let catalog = ThemeCatalog::from_definitions([
//!     ThemeDefinition::stylesheet("base", "Base"),
//!     ThemeDefinition::stylesheet("brand", "Brand").with_dependencies(["base"]),
//! ]);
//!
//! let mut registry = ThemeRegistry::new();
//! registry.initialize(catalog.themes, catalog.dependencies);
//! assert_eq!(registry.resolve_dependency_order("brand").unwrap(), ["base", "brand"]);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::ThemeDefinition;
use crate::error::{ThemeError, ThemeResult};
use crate::theme::Theme;

/// Theme definitions plus an optional dependency override map, as produced
/// by the catalog configuration loader.
#[derive(Debug, Clone, Default)]
pub struct ThemeCatalog {
    /// Definitions keyed by id.
    pub themes: IndexMap<String, ThemeDefinition>,
    /// Per-id dependency lists that replace the definitions' own.
    pub dependencies: Option<HashMap<String, Vec<String>>>,
}

impl ThemeCatalog {
    /// Build a catalog from definitions, keyed by their ids.
    pub fn from_definitions(definitions: impl IntoIterator<Item = ThemeDefinition>) -> Self {
        Self {
            themes: definitions.into_iter().map(|d| (d.id.clone(), d)).collect(),
            dependencies: None,
        }
    }

    /// Attach a dependency override map.
    pub fn with_dependencies(mut self, dependencies: HashMap<String, Vec<String>>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }
}

/// Supplies a [ThemeCatalog], typically by reading project configuration.
pub trait ThemeCatalogSource {
    /// Produce the catalog.
    fn load_catalog(&self) -> anyhow::Result<ThemeCatalog>;
}

impl ThemeCatalogSource for ThemeCatalog {
    fn load_catalog(&self) -> anyhow::Result<ThemeCatalog> {
        Ok(self.clone())
    }
}

/// Registry-owned state for one theme.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// The static descriptor.
    pub definition: ThemeDefinition,
    /// Whether the theme has been loaded.
    pub loaded: bool,
    /// The materialized theme, for programmatic themes.
    pub theme: Option<Arc<Theme>>,
    /// Normalized dependencies: no duplicates. A self-edge is kept and resolves as a cycle.
    pub dependencies: Vec<String>,
    /// Registered themes that depend on this one.
    pub dependents: Vec<String>,
}

/// Outcome of [ThemeRegistry::validate].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryValidation {
    /// `true` when every theme resolves.
    pub valid: bool,
    /// Every distinct resolution problem.
    pub errors: Vec<ThemeError>,
}

/// Catalog of theme definitions with a dependency graph.
#[derive(Debug, Default)]
pub struct ThemeRegistry {
    entries: IndexMap<String, RegistryEntry>,
    initialized: bool,
}

impl ThemeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every definition and build the reverse edges.
    ///
    /// A second call without [clear](Self::clear) in between does nothing.
    pub fn initialize(
        &mut self,
        themes: IndexMap<String, ThemeDefinition>,
        dependency_map: Option<HashMap<String, Vec<String>>>,
    ) {
        if self.initialized {
            log::debug!("Theme registry already initialized, ignoring catalog");
            return;
        }

        let mut dependency_map = dependency_map.unwrap_or_default();
        for (id, mut definition) in themes {
            definition.id = id.clone();
            let declared = dependency_map
                .remove(&id)
                .unwrap_or_else(|| definition.dependencies.clone());

            let mut dependencies: Vec<String> = Vec::with_capacity(declared.len());
            for dependency in declared {
                if dependency == id {
                    log::warn!("Theme '{}' depends on itself", id);
                }
                if !dependencies.contains(&dependency) {
                    dependencies.push(dependency);
                }
            }

            self.entries.insert(
                id,
                RegistryEntry {
                    definition,
                    loaded: false,
                    theme: None,
                    dependencies,
                    dependents: Vec::new(),
                },
            );
        }

        let edges: Vec<(String, String)> = self
            .entries
            .iter()
            .flat_map(|(id, entry)| entry.dependencies.iter().map(move |dep| (dep.clone(), id.clone())))
            .collect();
        for (dependency, dependent) in edges {
            if dependency == dependent {
                continue;
            }
            if let Some(entry) = self.entries.get_mut(&dependency) {
                entry.dependents.push(dependent);
            }
        }

        self.initialized = true;
        log::debug!("Theme registry initialized with {} themes", self.entries.len());
    }

    /// Initialize from a catalog source. A source failure becomes
    /// [ThemeError::ConfigLoadFailed].
    pub fn initialize_from(&mut self, source: &dyn ThemeCatalogSource) -> ThemeResult<()> {
        let catalog = source.load_catalog().map_err(|err| ThemeError::config_load_failed(format!("{err:#}")))?;
        self.initialize(catalog.themes, catalog.dependencies);
        Ok(())
    }

    /// Whether [initialize](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether `id` is registered.
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// The registry entry for `id`.
    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    /// The definition for `id`.
    pub fn get_definition(&self, id: &str) -> Option<&ThemeDefinition> {
        self.entries.get(id).map(|entry| &entry.definition)
    }

    /// Normalized direct dependencies of `id`.
    pub fn get_dependencies(&self, id: &str) -> &[String] {
        self.entries.get(id).map(|e| e.dependencies.as_slice()).unwrap_or_default()
    }

    /// Registered direct dependents of `id`.
    pub fn get_dependents(&self, id: &str) -> &[String] {
        self.entries.get(id).map(|e| e.dependents.as_slice()).unwrap_or_default()
    }

    /// All ids, in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// All definitions, in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ThemeDefinition> {
        self.entries.values().map(|entry| &entry.definition)
    }

    /// Number of registered themes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no theme is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in load order: every transitive dependency once, before its
    /// dependents, with `id` last.
    pub fn resolve_dependency_order(&self, id: &str) -> ThemeResult<Vec<String>> {
        if !self.has(id) {
            return Err(ThemeError::not_found(id));
        }

        let mut resolver = Resolver {
            registry: self,
            visiting: HashSet::new(),
            visited: HashSet::new(),
            path: Vec::new(),
            order: Vec::new(),
        };
        resolver.visit(id)?;
        Ok(resolver.order)
    }

    /// Resolve every theme and collect all problems without failing.
    pub fn validate(&self) -> RegistryValidation {
        let mut errors: Vec<ThemeError> = Vec::new();
        for id in self.entries.keys() {
            if let Err(err) = self.resolve_dependency_order(id) {
                if !errors.contains(&err) {
                    errors.push(err);
                }
            }
        }
        RegistryValidation {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Record that `id` was loaded, with the materialized theme if any.
    pub fn mark_loaded(&mut self, id: &str, theme: Option<Arc<Theme>>) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.loaded = true;
            if theme.is_some() {
                entry.theme = theme;
            }
        }
    }

    /// Record that the assets of `id` were detached. The materialized theme is kept.
    pub fn mark_unloaded(&mut self, id: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.loaded = false;
        }
    }

    /// The materialized theme for `id`.
    pub fn get_theme(&self, id: &str) -> Option<Arc<Theme>> {
        self.entries.get(id).and_then(|entry| entry.theme.clone())
    }

    /// Whether `id` has been loaded.
    pub fn is_theme_loaded(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|entry| entry.loaded)
    }

    /// Drop every entry and allow a fresh [initialize](Self::initialize).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.initialized = false;
    }
}

struct Resolver<'a> {
    registry: &'a ThemeRegistry,
    visiting: HashSet<String>,
    visited: HashSet<String>,
    path: Vec<String>,
    order: Vec<String>,
}

impl Resolver<'_> {
    fn visit(&mut self, id: &str) -> ThemeResult<()> {
        if self.visited.contains(id) {
            return Ok(());
        }
        if self.visiting.contains(id) {
            let start = self.path.iter().position(|p| p == id).unwrap_or(0);
            let mut cycle = self.path[start..].to_vec();
            cycle.push(id.to_string());
            return Err(ThemeError::CircularDependency { path: cycle });
        }

        self.visiting.insert(id.to_string());
        self.path.push(id.to_string());

        let registry = self.registry;
        for dependency in registry.get_dependencies(id) {
            if !registry.has(dependency) {
                return Err(ThemeError::missing_dependency(id, dependency.as_str()));
            }
            self.visit(dependency)?;
        }

        self.path.pop();
        self.visiting.remove(id);
        self.visited.insert(id.to_string());
        self.order.push(id.to_string());
        Ok(())
    }
}
