use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

type SpacingFn = dyn Fn(f32) -> String + Send + Sync;

/// Maps a unit multiplier to a CSS length string.
///
/// Spacing is the one part of a [Theme](super::Theme) that is behavior
/// rather than data, so it is a shared function. Deserializing a spacing
/// value accepts a number, the base unit in pixels.
#[derive(Clone)]
pub struct Spacing {
    func: Arc<SpacingFn>,
    base: Option<f32>,
}

impl Spacing {
    /// Linear spacing: `factor * base` pixels.
    pub fn scale(base: f32) -> Self {
        Self {
            func: Arc::new(move |factor| format!("{}px", factor * base)),
            base: Some(base),
        }
    }

    /// Spacing backed by an arbitrary function.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(f32) -> String + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            base: None,
        }
    }

    /// Resolve a multiplier to a length.
    pub fn get(&self, factor: f32) -> String {
        (self.func)(factor)
    }

    /// The pixel base unit, for linear spacing.
    pub fn base(&self) -> Option<f32> {
        self.base
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self::scale(4.0)
    }
}

impl fmt::Debug for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.base {
            Some(base) => f.debug_tuple("Spacing::scale").field(&base).finish(),
            None => f.write_str("Spacing::from_fn(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for Spacing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let base = f32::deserialize(deserializer)?;
        Ok(Self::scale(base))
    }
}
