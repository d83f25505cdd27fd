//! CSS custom property generation for programmatic themes.
//!
//! Tokens are flat: `--{prefix}-primary`, `--{prefix}-primary-rgb`,
//! `--{prefix}-font-size-base`, `--{prefix}-spacing-4` and so on, so that
//! stylesheet themes and programmatic themes can target the same names.

use std::panic::{self, AssertUnwindSafe};

use indexmap::IndexMap;

use crate::color;
use crate::theme::Theme;

const SPACING_STEPS: [f32; 8] = [0.5, 1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 12.0];

/// Collect the custom properties for `theme`, in emission order.
///
/// Keys include the leading `--`.
pub fn css_variables(theme: &Theme, prefix: &str) -> IndexMap<String, String> {
    let mut vars = IndexMap::new();
    let mut set = |name: String, value: String| {
        vars.insert(format!("--{prefix}-{name}"), value);
    };

    for (name, group) in &theme.palette.colors {
        set(name.clone(), group.main.clone());
        if let Some(rgb) = color::parse_color(&group.main) {
            set(format!("{name}-rgb"), format!("{}, {}, {}", rgb.r, rgb.g, rgb.b));
        }
        let light = group.light.clone().unwrap_or_else(|| color::lighten(&group.main, 0.2));
        let dark = group.dark.clone().unwrap_or_else(|| color::darken(&group.main, 0.2));
        set(format!("{name}-light"), light);
        set(format!("{name}-hover"), dark);
        let contrast_text = group
            .contrast_text
            .clone()
            .unwrap_or_else(|| color::contrast_text(&group.main, 3.0).to_string());
        set(format!("{name}-contrast-text"), contrast_text);
        set(format!("{name}-bg-subtle"), color::alpha(&group.main, 0.1));
        set(format!("{name}-border-subtle"), color::alpha(&group.main, 0.2));
    }

    if let Some(background) = &theme.palette.background {
        set("body-bg".to_string(), background.default.clone());
        set("paper-bg".to_string(), background.paper.clone());
        if let Some(subtle) = &background.subtle {
            set("subtle-bg".to_string(), subtle.clone());
        }
    }
    if let Some(text) = &theme.palette.text {
        set("body-color".to_string(), text.primary.clone());
        set("secondary-color".to_string(), text.secondary.clone());
        set("disabled-color".to_string(), text.disabled.clone());
    }

    let typography = &theme.typography;
    set("font-family".to_string(), typography.font_family.clone());
    set("font-size-base".to_string(), format!("{}px", typography.font_size));
    set("font-weight-light".to_string(), typography.font_weight_light.to_string());
    set("font-weight-normal".to_string(), typography.font_weight_regular.to_string());
    set("font-weight-medium".to_string(), typography.font_weight_medium.to_string());
    set("font-weight-bold".to_string(), typography.font_weight_bold.to_string());
    set("line-height-base".to_string(), typography.line_height.to_string());

    let spacing = theme.spacing_or_default();
    for step in SPACING_STEPS {
        match panic::catch_unwind(AssertUnwindSafe(|| spacing.get(step))) {
            Ok(value) if !value.is_empty() => set(format!("spacing-{}", step.to_string().replace('.', "_")), value),
            Ok(_) => {},
            Err(_) => {
                log::warn!("Spacing function panicked for {}, skipping spacing tokens", step);
                break;
            },
        }
    }

    for (name, value) in &theme.breakpoints.values {
        set(format!("breakpoint-{name}"), format!("{value}px"));
    }

    vars
}

/// Render the custom properties for `theme` as a single CSS rule.
///
/// ```rust
/// use swatch_theme::css::generate_css_variables;
/// use swatch_theme::theme::Theme;
///
/// let css = generate_css_variables(&Theme::dark(), ":root", "swatch");
/// assert!(css.starts_with(":root {"));
/// assert!(css.contains("--swatch-body-bg: #111827;"));
/// ```
pub fn generate_css_variables(theme: &Theme, selector: &str, prefix: &str) -> String {
    let vars = css_variables(theme, prefix);
    let mut css = String::with_capacity(vars.len() * 40);
    css.push_str(selector);
    css.push_str(" {\n");
    for (name, value) in &vars {
        css.push_str("  ");
        css.push_str(name);
        css.push_str(": ");
        css.push_str(value);
        css.push_str(";\n");
    }
    css.push('}');
    css
}
