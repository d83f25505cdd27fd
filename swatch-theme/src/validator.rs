//! # Theme Validation
//!
//! [ThemeValidator] inspects a [Theme] for structural problems and WCAG
//! contrast issues. It never mutates or rejects anything on its own: the
//! engine logs the outcome and applies the theme regardless, and hosts can
//! call the validator directly to gate themes more strictly.
//!
//! The four checks (palette, typography, spacing, breakpoints) are
//! independent and all of them always run.
//!
//! ```rust
//! use swatch_theme::theme::{Theme, palette::PaletteColor};
//! use swatch_theme::validator::ThemeValidator;
//!
//! let mut theme = Theme::light();
//! theme.palette.colors.insert(
//!     "primary".into(),
//!     PaletteColor::new("#777777", "#999999", "#555555", "#999999"),
//! );
//!
//! let result = ThemeValidator::new().validate(&theme, None);
//! assert!(!result.valid);
//! ```

use std::panic::{self, AssertUnwindSafe};

use crate::color;
use crate::definition::ThemeMetadata;
use crate::theme::palette::Palette;
use crate::theme::spacing::Spacing;
use crate::theme::{Breakpoints, Theme, Typography, REQUIRED_BREAKPOINTS};

/// Category of an accessibility issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A contrast ratio below target.
    Contrast,
    /// A color value that cannot be parsed.
    Color,
    /// A required value is absent.
    Missing,
}

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Makes the theme invalid.
    Error,
    /// Reported only.
    Warning,
}

/// A single accessibility finding.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessibilityIssue {
    /// Issue category.
    pub kind: IssueKind,
    /// Issue severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Dotted path of the affected property, e.g. `palette.primary`.
    pub property: Option<String>,
    /// The offending value.
    pub value: Option<String>,
}

/// Outcome of [ThemeValidator::validate].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// `true` when there are no errors. Warnings do not affect validity.
    pub valid: bool,
    /// Error messages.
    pub errors: Vec<String>,
    /// Warning messages.
    pub warnings: Vec<String>,
    /// Structured accessibility findings. Every entry is also reflected in
    /// `errors` or `warnings` according to its severity.
    pub accessibility_issues: Vec<AccessibilityIssue>,
}

impl ValidationResult {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn issue(&mut self, issue: AccessibilityIssue) {
        match issue.severity {
            Severity::Error => self.errors.push(issue.message.clone()),
            Severity::Warning => self.warnings.push(issue.message.clone()),
        }
        self.accessibility_issues.push(issue);
    }
}

/// Validates palette, typography, spacing and breakpoints of a [Theme].
#[derive(Debug, Clone, Copy)]
pub struct ThemeValidator {
    min_contrast: f64,
    default_contrast_target: f64,
    min_font_size: f32,
}

impl Default for ThemeValidator {
    fn default() -> Self {
        Self {
            min_contrast: 3.0,
            default_contrast_target: 4.5,
            min_font_size: 12.0,
        }
    }
}

impl ThemeValidator {
    /// Create a validator with WCAG AA thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a theme. `metadata` may raise or lower the contrast target.
    pub fn validate(&self, theme: &Theme, metadata: Option<&ThemeMetadata>) -> ValidationResult {
        let target = metadata
            .and_then(|m| m.a11y)
            .map(|a| a.contrast_target)
            .unwrap_or(self.default_contrast_target);

        let mut result = ValidationResult::default();
        self.validate_palette(&theme.palette, target, &mut result);
        self.validate_typography(&theme.typography, &mut result);
        self.validate_spacing(theme.spacing.as_ref(), &mut result);
        self.validate_breakpoints(&theme.breakpoints, &mut result);
        result.valid = result.errors.is_empty();
        result
    }

    fn validate_palette(&self, palette: &Palette, target: f64, result: &mut ValidationResult) {
        if palette.primary().is_none() {
            result.issue(AccessibilityIssue {
                kind: IssueKind::Missing,
                severity: Severity::Error,
                message: "Palette must define a primary color".to_string(),
                property: Some("palette.primary".to_string()),
                value: None,
            });
        }

        for (name, group) in &palette.colors {
            let property = format!("palette.{name}");
            let main_ok = self.check_color(&format!("{property}.main"), &group.main, result);

            let contrast_text = match &group.contrast_text {
                Some(text) => text.as_str(),
                None => {
                    result.issue(AccessibilityIssue {
                        kind: IssueKind::Missing,
                        severity: Severity::Warning,
                        message: format!("{name} has no contrast text, assuming #000000"),
                        property: Some(format!("{property}.contrastText")),
                        value: None,
                    });
                    "#000000"
                },
            };
            let text_ok = self.check_color(&format!("{property}.contrastText"), contrast_text, result);

            if main_ok && text_ok {
                self.check_contrast(name, &property, &group.main, contrast_text, target, result);
            }
        }

        if let (Some(background), Some(text)) = (&palette.background, &palette.text) {
            let bg_ok = self.check_color("palette.background.default", &background.default, result);
            let text_ok = self.check_color("palette.text.primary", &text.primary, result);
            if bg_ok && text_ok {
                self.check_contrast("Text", "palette.text.primary", &text.primary, &background.default, target, result);
            }
        }
    }

    fn check_color(&self, property: &str, value: &str, result: &mut ValidationResult) -> bool {
        if color::is_valid_color(value) {
            return true;
        }
        result.issue(AccessibilityIssue {
            kind: IssueKind::Color,
            severity: Severity::Error,
            message: format!("Invalid color value for {property}: {value}"),
            property: Some(property.to_string()),
            value: Some(value.to_string()),
        });
        false
    }

    fn check_contrast(
        &self,
        label: &str,
        property: &str,
        foreground: &str,
        background: &str,
        target: f64,
        result: &mut ValidationResult,
    ) {
        let ratio = color::contrast_ratio(foreground, background).unwrap_or(0.0);
        if ratio >= target {
            return;
        }
        let severity = if ratio < self.min_contrast {
            Severity::Error
        } else {
            Severity::Warning
        };
        result.issue(AccessibilityIssue {
            kind: IssueKind::Contrast,
            severity,
            message: format!("{label} color contrast ratio ({ratio:.2}) is below target ({target})"),
            property: Some(property.to_string()),
            value: Some(foreground.to_string()),
        });
    }

    fn validate_typography(&self, typography: &Typography, result: &mut ValidationResult) {
        if typography.font_family.trim().is_empty() {
            result.error("Typography must have a fontFamily");
        }

        let size = typography.font_size;
        if !size.is_finite() || size <= 0.0 {
            result.error("Typography must have a valid fontSize");
        } else if size < self.min_font_size {
            result.warning(format!(
                "Font size is below recommended minimum ({}px) for accessibility",
                self.min_font_size
            ));
        }
    }

    fn validate_spacing(&self, spacing: Option<&Spacing>, result: &mut ValidationResult) {
        let Some(spacing) = spacing else {
            result.error("Spacing must be a function");
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| spacing.get(1.0))) {
            Ok(sample) if sample.trim().is_empty() => {
                result.error("Spacing function must return a non-empty string");
            },
            Ok(_) => {},
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panicked".to_string());
                result.error(format!("Spacing function error: {reason}"));
            },
        }
    }

    fn validate_breakpoints(&self, breakpoints: &Breakpoints, result: &mut ValidationResult) {
        let mut values = Vec::with_capacity(REQUIRED_BREAKPOINTS.len());
        for name in REQUIRED_BREAKPOINTS {
            match breakpoints.get(name) {
                Some(value) if value.is_finite() => values.push(value),
                _ => result.error(format!("Breakpoint {name} must be a number")),
            }
        }

        if values.windows(2).any(|pair| pair[1] <= pair[0]) {
            result.warning("Breakpoint values should be in ascending order");
        }
    }
}
