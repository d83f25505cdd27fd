//! # Theme Error Types
//!
//! This module provides the error taxonomy for the theme engine. Every
//! failure that crosses the engine boundary is translated into a
//! [ThemeError] at its point of origin; collaborator errors ([SinkError],
//! [StorageError]) never escape raw.
//!
//! [ThemeError] is `Clone` because a single in-flight load can be awaited by
//! several callers, and each of them observes the same outcome.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stable, machine-readable classification of a [ThemeError].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeErrorCode {
    /// Theme id absent from the registry.
    ThemeNotFound,
    /// IO or factory failure while loading, including a refused retry.
    ThemeLoadFailed,
    /// The theme catalog could not be obtained.
    ConfigLoadFailed,
    /// The dependency graph contains a cycle.
    CircularDependency,
    /// A theme depends on an unregistered theme.
    MissingDependency,
}

impl ThemeErrorCode {
    /// The upper-snake name used in logs and by host UIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThemeNotFound => "THEME_NOT_FOUND",
            Self::ThemeLoadFailed => "THEME_LOAD_FAILED",
            Self::ConfigLoadFailed => "CONFIG_LOAD_FAILED",
            Self::CircularDependency => "CIRCULAR_DEPENDENCY",
            Self::MissingDependency => "MISSING_DEPENDENCY",
        }
    }
}

impl fmt::Display for ThemeErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in the theme engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThemeError {
    /// Theme with the specified id is not registered.
    #[error("Theme '{id}' not found in registry")]
    ThemeNotFound {
        /// The id that was requested.
        id: String,
    },

    /// Loading the theme failed.
    #[error("Failed to load theme '{id}': {reason}")]
    ThemeLoadFailed {
        /// The id of the theme that failed.
        id: String,
        /// Description of the underlying failure.
        reason: String,
        /// Set when the load was refused because an earlier attempt failed.
        previously_failed: bool,
    },

    /// The theme catalog could not be obtained from its source.
    #[error("Failed to load theme configuration: {details}")]
    ConfigLoadFailed {
        /// Details about the failure.
        details: String,
    },

    /// A dependency cycle was found while resolving load order.
    #[error("Circular dependency detected: {}", path.join(" -> "))]
    CircularDependency {
        /// The cycle, starting and ending with the same id.
        path: Vec<String>,
    },

    /// A theme declares a dependency on an id that is not registered.
    #[error("Theme '{id}' depends on non-existent theme '{dependency}'")]
    MissingDependency {
        /// The dependent theme.
        id: String,
        /// The unregistered dependency.
        dependency: String,
    },
}

/// Result type alias for theme operations.
pub type ThemeResult<T> = Result<T, ThemeError>;

impl ThemeError {
    /// Create a theme not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::ThemeNotFound { id: id.into() }
    }

    /// Create a load failure from any displayable cause.
    pub fn load_failed(id: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::ThemeLoadFailed {
            id: id.into(),
            reason: reason.to_string(),
            previously_failed: false,
        }
    }

    /// Create the error returned when a previously failed theme is requested without `force`.
    pub fn previously_failed(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::ThemeLoadFailed {
            reason: format!("theme '{id}' failed previously; pass `force` to retry"),
            id,
            previously_failed: true,
        }
    }

    /// Create a configuration load error.
    pub fn config_load_failed(details: impl fmt::Display) -> Self {
        Self::ConfigLoadFailed {
            details: details.to_string(),
        }
    }

    /// Create a missing dependency error.
    pub fn missing_dependency(id: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            id: id.into(),
            dependency: dependency.into(),
        }
    }

    /// The taxonomy code of this error.
    pub fn code(&self) -> ThemeErrorCode {
        match self {
            Self::ThemeNotFound { .. } => ThemeErrorCode::ThemeNotFound,
            Self::ThemeLoadFailed { .. } => ThemeErrorCode::ThemeLoadFailed,
            Self::ConfigLoadFailed { .. } => ThemeErrorCode::ConfigLoadFailed,
            Self::CircularDependency { .. } => ThemeErrorCode::CircularDependency,
            Self::MissingDependency { .. } => ThemeErrorCode::MissingDependency,
        }
    }

    /// Whether this is a refusal to retry a theme that already failed.
    pub fn is_previously_failed(&self) -> bool {
        matches!(
            self,
            Self::ThemeLoadFailed {
                previously_failed: true,
                ..
            }
        )
    }
}

/// Errors reported by a [StyleSink](crate::sink::StyleSink) implementation.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The stylesheet resource could not be read.
    #[error("Failed to read stylesheet {path:?}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The host refused or failed to attach the stylesheet.
    #[error("Stylesheet '{link_id}' could not be attached: {details}")]
    Rejected {
        /// The link id of the stylesheet.
        link_id: String,
        /// Details from the host.
        details: String,
    },
}

/// Errors reported by a [ThemeStorage](crate::storage::ThemeStorage) implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store is not available in this environment.
    #[error("Theme storage is not available")]
    Unavailable,

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error serializing or deserializing stored data.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
