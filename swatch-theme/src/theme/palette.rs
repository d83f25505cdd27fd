use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color;

/// Semantic color groups every palette is expected to carry.
pub const SEMANTIC_COLORS: [&str; 6] = ["primary", "secondary", "error", "warning", "info", "success"];

/// A named color group: a main value and the text color drawn on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColor {
    /// Main color value.
    pub main: String,
    /// Lighter variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<String>,
    /// Darker variant, used for hover states.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark: Option<String>,
    /// Text color drawn on `main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contrast_text: Option<String>,
}

impl PaletteColor {
    /// A group with only a main value; variants and contrast text are derived.
    pub fn from_main(main: impl Into<String>) -> Self {
        let main = main.into();
        Self {
            light: Some(color::lighten(&main, 0.2)),
            dark: Some(color::darken(&main, 0.2)),
            contrast_text: Some(color::contrast_text(&main, 3.0).to_string()),
            main,
        }
    }

    /// A fully specified group.
    pub fn new(
        main: impl Into<String>,
        light: impl Into<String>,
        dark: impl Into<String>,
        contrast_text: impl Into<String>,
    ) -> Self {
        Self {
            main: main.into(),
            light: Some(light.into()),
            dark: Some(dark.into()),
            contrast_text: Some(contrast_text.into()),
        }
    }
}

/// Surface colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundColors {
    /// Page background.
    pub default: String,
    /// Raised surfaces.
    pub paper: String,
    /// Tertiary surfaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtle: Option<String>,
}

/// Text colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextColors {
    /// Body text.
    pub primary: String,
    /// Muted labels.
    pub secondary: String,
    /// Disabled controls.
    pub disabled: String,
}

/// Shared palette description for themes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Palette {
    /// Named color groups, in declaration order.
    #[serde(flatten)]
    pub colors: IndexMap<String, PaletteColor>,
    /// Surface colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundColors>,
    /// Text colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextColors>,
}

impl Palette {
    /// Get a color group by name.
    pub fn get(&self, name: &str) -> Option<&PaletteColor> {
        self.colors.get(name)
    }

    /// Insert or replace a color group, returning `self` for chaining.
    pub fn with_color(mut self, name: impl Into<String>, color: PaletteColor) -> Self {
        self.colors.insert(name.into(), color);
        self
    }

    /// The primary group, if defined.
    pub fn primary(&self) -> Option<&PaletteColor> {
        self.get("primary")
    }

    /// Standard palette for the light design-system theme.
    pub fn light() -> Self {
        let colors = [
            ("primary", PaletteColor::new("#7c3aed", "#d0b2f5", "#3c1583", "#ffffff")),
            ("secondary", PaletteColor::new("#f3f4f6", "#ffffff", "#e5e7eb", "#1f2937")),
            ("error", PaletteColor::new("#ef4444", "#fca5a5", "#991b1b", "#ffffff")),
            ("warning", PaletteColor::new("#eab308", "#fde047", "#854d0e", "#000000")),
            ("info", PaletteColor::new("#3b82f6", "#93c5fd", "#1e40af", "#ffffff")),
            ("success", PaletteColor::new("#22c55e", "#86efac", "#166534", "#000000")),
        ];
        Self {
            colors: colors
                .into_iter()
                .map(|(name, color)| (name.to_string(), color))
                .collect(),
            background: Some(BackgroundColors {
                default: "#ffffff".to_string(),
                paper: "#f3f4f6".to_string(),
                subtle: Some("#d1d5db".to_string()),
            }),
            text: Some(TextColors {
                primary: "#111827".to_string(),
                secondary: "#374151".to_string(),
                disabled: "#9ca3af".to_string(),
            }),
        }
    }

    /// Standard palette for the dark design-system theme.
    pub fn dark() -> Self {
        let mut palette = Self::light();
        palette.colors.insert(
            "secondary".to_string(),
            PaletteColor::new("#374151", "#4b5563", "#1f2937", "#f9fafb"),
        );
        palette.background = Some(BackgroundColors {
            default: "#111827".to_string(),
            paper: "#1f2937".to_string(),
            subtle: Some("#374151".to_string()),
        });
        palette.text = Some(TextColors {
            primary: "#f9fafb".to_string(),
            secondary: "#d1d5db".to_string(),
            disabled: "#6b7280".to_string(),
        });
        palette
    }
}
