//! CSS color parsing and WCAG color math.
//!
//! Theme palettes carry colors as CSS strings. This module parses the
//! subset the engine understands (`#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`,
//! `rgba()`, `hsl()`, `hsla()`) and implements the relative-luminance and
//! contrast-ratio formulas used by the validator, plus the small set of
//! color helpers used when generating CSS variables.

use std::fmt;

/// An sRGB color with 8-bit channels and a unit alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha in `0.0..=1.0`.
    pub a: f64,
}

impl Rgb {
    /// Opaque color from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Format as `#rrggbb`, dropping alpha.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// WCAG 2.x relative luminance.
    pub fn luminance(&self) -> f64 {
        fn channel(c: u8) -> f64 {
            let v = f64::from(c) / 255.0;
            if v <= 0.03928 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Parse a CSS color string.
///
/// Returns `None` for anything outside the supported syntax, including
/// named colors.
pub fn parse_color(input: &str) -> Option<Rgb> {
    let s = input.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = s.to_ascii_lowercase();
    let (name, args) = lower.split_once('(')?;
    let args = args.strip_suffix(')')?;
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();

    match (name.trim(), parts.len()) {
        ("rgb", 3) | ("rgba", 4) | ("rgb", 4) => {
            let r = parse_channel(parts[0])?;
            let g = parse_channel(parts[1])?;
            let b = parse_channel(parts[2])?;
            let a = match parts.get(3) {
                Some(a) => parse_alpha(a)?,
                None => 1.0,
            };
            Some(Rgb { r, g, b, a })
        }
        ("hsl", 3) | ("hsla", 4) | ("hsl", 4) => {
            let h = parts[0].trim_end_matches("deg").parse::<f64>().ok()?;
            let s = parse_percent(parts[1])?;
            let l = parse_percent(parts[2])?;
            let a = match parts.get(3) {
                Some(a) => parse_alpha(a)?,
                None => 1.0,
            };
            let (r, g, b) = hsl_to_rgb(h, s, l);
            Some(Rgb { r, g, b, a })
        }
        _ => None,
    }
}

/// Whether the string is a color in one of the supported syntaxes.
pub fn is_valid_color(input: &str) -> bool {
    parse_color(input).is_some()
}

/// WCAG contrast ratio between two colors, `1.0..=21.0`.
///
/// Returns `None` if either color cannot be parsed.
pub fn contrast_ratio(foreground: &str, background: &str) -> Option<f64> {
    let a = parse_color(foreground)?.luminance();
    let b = parse_color(background)?.luminance();
    Some((a.max(b) + 0.05) / (a.min(b) + 0.05))
}

/// Pick black or white text for a background, preferring white at `threshold`.
pub fn contrast_text(background: &str, threshold: f64) -> &'static str {
    let white = contrast_ratio("#ffffff", background).unwrap_or(0.0);
    let black = contrast_ratio("#000000", background).unwrap_or(0.0);
    if white >= threshold {
        "#ffffff"
    } else if black >= threshold || black > white {
        "#000000"
    } else {
        "#ffffff"
    }
}

/// Mix a color towards white by `amount` (`0.0..=1.0`).
pub fn lighten(color: &str, amount: f64) -> String {
    match parse_color(color) {
        Some(c) => {
            let mix = |v: u8| (f64::from(v) + (255.0 - f64::from(v)) * amount.clamp(0.0, 1.0)).round() as u8;
            Rgb::new(mix(c.r), mix(c.g), mix(c.b)).to_hex()
        }
        None => color.to_string(),
    }
}

/// Mix a color towards black by `amount` (`0.0..=1.0`).
pub fn darken(color: &str, amount: f64) -> String {
    match parse_color(color) {
        Some(c) => {
            let mix = |v: u8| (f64::from(v) * (1.0 - amount.clamp(0.0, 1.0))).round() as u8;
            Rgb::new(mix(c.r), mix(c.g), mix(c.b)).to_hex()
        }
        None => color.to_string(),
    }
}

/// Render a color as `rgba()` with the given opacity.
pub fn alpha(color: &str, opacity: f64) -> String {
    match parse_color(color) {
        Some(c) => format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, opacity.clamp(0.0, 1.0)),
        None => color.to_string(),
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => {
            let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Rgb::new(nibble(0)?, nibble(1)?, nibble(2)?))
        }
        6 => Some(Rgb::new(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgb {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: f64::from(byte(6)?) / 255.0,
        }),
        _ => None,
    }
}

fn parse_channel(part: &str) -> Option<u8> {
    let value = match part.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? * 2.55,
        None => part.parse::<f64>().ok()?,
    };
    (0.0..=255.0).contains(&value).then(|| value.round() as u8)
}

fn parse_percent(part: &str) -> Option<f64> {
    let value = part.strip_suffix('%')?.parse::<f64>().ok()?;
    (0.0..=100.0).contains(&value).then_some(value / 100.0)
}

fn parse_alpha(part: &str) -> Option<f64> {
    let value = match part.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? / 100.0,
        None => part.parse::<f64>().ok()?,
    };
    (0.0..=1.0).contains(&value).then_some(value)
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0) / 360.0;
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let hue = |mut t: f64| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    (hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}
