//! # Theme Model
//!
//! A [Theme] is the fully materialized, render-ready value behind a
//! programmatic theme: palette, typography, spacing and breakpoints.
//!
//! Construction never rejects a theme. Structural problems (a missing
//! breakpoint, an unreadable color, a zero font size) are reported by the
//! [ThemeValidator](crate::validator::ThemeValidator) so that hosts can
//! decide how strict to be.
//!
//! ## Usage Examples
//!
//! ```rust
//! use swatch_theme::theme::{Theme, palette::PaletteColor};
//!
//! let mut theme = Theme::default().with_name("brand");
//! theme.palette.colors.insert("primary".into(), PaletteColor::from_main("#0f766e"));
//! assert_eq!(theme.spacing_or_default().get(2.0), "8px");
//! ```
//!
//! Themes can also be authored as data:
//!
//! ```rust
//! use swatch_theme::theme::Theme;
//!
//! let theme: Theme = serde_json::from_str(r##"{
//!     "name": "mono",
//!     "palette": { "primary": { "main": "#000000", "contrastText": "#ffffff" } },
//!     "typography": { "fontFamily": "monospace", "fontSize": 14 },
//!     "spacing": 8,
//!     "breakpoints": { "xs": 0, "sm": 600, "md": 900, "lg": 1200, "xl": 1536 }
//! }"##).unwrap();
//! assert_eq!(theme.breakpoints.get("md"), Some(900.0));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Contains the [palette::Palette] and its color groups.
pub mod palette;
/// Contains the [spacing::Spacing] function wrapper.
pub mod spacing;

use palette::Palette;
use spacing::Spacing;

/// Breakpoint names every theme must define, in ascending order.
pub const REQUIRED_BREAKPOINTS: [&str; 5] = ["xs", "sm", "md", "lg", "xl"];

/// A render-ready theme.
///
/// `Theme::default()` is the light design-system theme. Fields missing
/// from deserialized data stay empty so the validator can report them.
#[derive(Debug, Clone, Deserialize)]
pub struct Theme {
    /// Name used as the theme marker when applied without a registry id.
    #[serde(default)]
    pub name: Option<String>,
    /// Color groups, backgrounds and text colors.
    #[serde(default)]
    pub palette: Palette,
    /// Font settings.
    #[serde(default)]
    pub typography: Typography,
    /// Spacing function. Absent spacing is a validation error.
    #[serde(default)]
    pub spacing: Option<Spacing>,
    /// Responsive breakpoints.
    #[serde(default)]
    pub breakpoints: Breakpoints,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    /// The light design-system theme.
    pub fn light() -> Self {
        Self {
            name: Some("light".to_string()),
            palette: Palette::light(),
            typography: Typography::default(),
            spacing: Some(Spacing::default()),
            breakpoints: Breakpoints::default(),
        }
    }

    /// The dark design-system theme.
    pub fn dark() -> Self {
        Self {
            name: Some("dark".to_string()),
            palette: Palette::dark(),
            ..Self::light()
        }
    }

    /// Set the theme name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Replace the spacing function.
    pub fn with_spacing(mut self, spacing: Spacing) -> Self {
        self.spacing = Some(spacing);
        self
    }

    /// The spacing function, or the 4px default.
    pub fn spacing_or_default(&self) -> Spacing {
        self.spacing.clone().unwrap_or_default()
    }
}

/// Font settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    /// CSS font-family stack.
    pub font_family: String,
    /// Base font size in device-independent pixels.
    pub font_size: f32,
    /// Light weight.
    pub font_weight_light: u16,
    /// Regular weight.
    pub font_weight_regular: u16,
    /// Medium weight.
    pub font_weight_medium: u16,
    /// Bold weight.
    pub font_weight_bold: u16,
    /// Unitless body line height.
    pub line_height: f32,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: r#""Roboto", "Helvetica Neue", "Helvetica", "Arial", sans-serif"#.to_string(),
            font_size: 16.0,
            font_weight_light: 300,
            font_weight_regular: 400,
            font_weight_medium: 500,
            font_weight_bold: 700,
            line_height: 1.5,
        }
    }
}

/// Named responsive thresholds in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Breakpoints {
    /// Threshold per name, in declaration order.
    pub values: IndexMap<String, f64>,
}

impl Breakpoints {
    /// Build from `(name, value)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Threshold for a name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// `@media (min-width: ...)` query for a named threshold.
    pub fn up(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| format!("@media (min-width:{v}px)"))
    }

    /// `@media (max-width: ...)` query just below a named threshold.
    pub fn down(&self, name: &str) -> Option<String> {
        self.get(name).map(|v| format!("@media (max-width:{}px)", v - 0.05))
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::from_pairs([
            ("xs", 0.0),
            ("sm", 576.0),
            ("md", 768.0),
            ("lg", 992.0),
            ("xl", 1200.0),
            ("xxl", 1440.0),
        ])
    }
}
