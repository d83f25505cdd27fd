#![warn(missing_docs)]

//! Runtime theming for design-system hosts.
//!
//! `swatch` bundles the theme engine ([theme]) with the host-side
//! collaborators ([services]): a collecting style sink for server
//! rendering, persistence stores and XDG settings loading.

pub use swatch_theme as theme;
#[cfg(feature = "services")]
pub use swatch_services as services;

/// A "prelude" for users of swatch.
///
/// Importing this module brings into scope the most common types
/// needed to register, load and apply themes.
///
/// ```rust
/// use swatch::prelude::*;
/// ```
pub mod prelude {
    pub use swatch_theme::prelude::*;

    #[cfg(feature = "services")]
    pub use swatch_services::{CollectingStyleSink, FileStorage, MemoryStorage, SettingsRegistry};
}
