//! Static theme descriptors supplied by the catalog configuration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

/// How a theme is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    /// An external stylesheet resource.
    Stylesheet,
    /// A [Theme] built by a factory.
    Programmatic,
}

/// Release status of a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeStatus {
    /// Ready for production.
    #[default]
    Stable,
    /// Feature complete, may still change.
    Beta,
    /// Work in progress.
    Experimental,
    /// Kept for compatibility.
    Deprecated,
}

/// Accessibility requirements declared by a theme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityTarget {
    /// Minimum contrast ratio the palette should reach.
    pub contrast_target: f64,
}

impl Default for AccessibilityTarget {
    fn default() -> Self {
        Self { contrast_target: 4.5 }
    }
}

/// Optional descriptive metadata attached to a definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeMetadata {
    /// Semantic version of the theme.
    pub version: Option<String>,
    /// Release status.
    pub status: ThemeStatus,
    /// Accessibility target, used by the validator.
    pub a11y: Option<AccessibilityTarget>,
    /// Representative color for theme pickers.
    pub color: Option<String>,
}

impl ThemeMetadata {
    /// The contrast ratio the validator should warn below.
    pub fn contrast_target(&self) -> f64 {
        self.a11y.unwrap_or_default().contrast_target
    }
}

type FactoryFn = dyn Fn() -> BoxFuture<'static, anyhow::Result<Theme>> + Send + Sync;

/// A zero-argument factory producing a [Theme].
///
/// Factories may be asynchronous and may fail; a failure is reported as a
/// theme load failure.
#[derive(Clone)]
pub struct ThemeFactory(Arc<FactoryFn>);

impl ThemeFactory {
    /// Wrap an infallible synchronous constructor.
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> Theme + Send + Sync + 'static,
    {
        Self(Arc::new(move || {
            let theme = create();
            async move { Ok(theme) }.boxed()
        }))
    }

    /// Wrap a fallible synchronous constructor.
    pub fn fallible<F>(create: F) -> Self
    where
        F: Fn() -> anyhow::Result<Theme> + Send + Sync + 'static,
    {
        Self(Arc::new(move || {
            let result = create();
            async move { result }.boxed()
        }))
    }

    /// Wrap an asynchronous constructor.
    pub fn from_async<F, Fut>(create: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Theme>> + Send + 'static,
    {
        Self(Arc::new(move || create().boxed()))
    }

    /// Run the factory.
    pub fn create(&self) -> BoxFuture<'static, anyhow::Result<Theme>> {
        (self.0)()
    }
}

impl fmt::Debug for ThemeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ThemeFactory(..)")
    }
}

/// Where a theme's assets come from.
#[derive(Debug, Clone)]
pub enum ThemeSource {
    /// An external stylesheet. Without a path, the engine derives one from its base path.
    Stylesheet {
        /// Explicit stylesheet location.
        css_path: Option<String>,
    },
    /// A factory building a [Theme].
    Programmatic(ThemeFactory),
}

/// Static descriptor of a theme, as supplied by the catalog configuration.
#[derive(Debug, Clone)]
pub struct ThemeDefinition {
    /// Unique id.
    pub id: String,
    /// Human-readable name.
    pub display_name: String,
    /// Asset source; selects the kind.
    pub source: ThemeSource,
    /// Ids of themes that must be loaded first.
    pub dependencies: Vec<String>,
    /// Marker value written for stylesheet themes, defaults to the id.
    pub class: Option<String>,
    /// Descriptive metadata.
    pub metadata: ThemeMetadata,
}

impl ThemeDefinition {
    /// A stylesheet theme whose path is derived from the engine base path.
    pub fn stylesheet(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::with_source(id, display_name, ThemeSource::Stylesheet { css_path: None })
    }

    /// A programmatic theme.
    pub fn programmatic(id: impl Into<String>, display_name: impl Into<String>, factory: ThemeFactory) -> Self {
        Self::with_source(id, display_name, ThemeSource::Programmatic(factory))
    }

    fn with_source(id: impl Into<String>, display_name: impl Into<String>, source: ThemeSource) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            source,
            dependencies: Vec::new(),
            class: None,
            metadata: ThemeMetadata::default(),
        }
    }

    /// Set an explicit stylesheet path. Ignored for programmatic themes.
    pub fn with_css_path(mut self, path: impl Into<String>) -> Self {
        if let ThemeSource::Stylesheet { css_path } = &mut self.source {
            *css_path = Some(path.into());
        }
        self
    }

    /// Declare dependencies.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the marker value used when applied.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: ThemeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// The kind selected by the source.
    pub fn kind(&self) -> ThemeKind {
        match self.source {
            ThemeSource::Stylesheet { .. } => ThemeKind::Stylesheet,
            ThemeSource::Programmatic(_) => ThemeKind::Programmatic,
        }
    }

    /// The explicit stylesheet path, if any.
    pub fn css_path(&self) -> Option<&str> {
        match &self.source {
            ThemeSource::Stylesheet { css_path } => css_path.as_deref(),
            ThemeSource::Programmatic(_) => None,
        }
    }

    /// The factory, for programmatic themes.
    pub fn factory(&self) -> Option<&ThemeFactory> {
        match &self.source {
            ThemeSource::Programmatic(factory) => Some(factory),
            ThemeSource::Stylesheet { .. } => None,
        }
    }

    /// The marker value written when this theme is applied.
    pub fn marker(&self) -> &str {
        self.class.as_deref().unwrap_or(&self.id)
    }
}
