//! The host-side surface the engine writes styles to.

use async_trait::async_trait;

use crate::error::SinkError;

/// Receives the style artifacts produced by the engine.
///
/// In a browser host this is the document head; a server renderer collects
/// the artifacts instead. Only stylesheet loading can suspend or fail; the
/// remaining operations are expected to succeed immediately.
#[async_trait]
pub trait StyleSink: Send + Sync {
    /// Attach the stylesheet at `path` under `link_id` and resolve once it is usable.
    async fn load_stylesheet(&self, path: &str, link_id: &str) -> Result<(), SinkError>;

    /// Detach the stylesheet with `link_id`, if attached.
    fn remove_stylesheet(&self, link_id: &str);

    /// Insert or replace the inline style block `style_id`.
    fn inject_inline_style(&self, css: &str, style_id: &str);

    /// Remove the inline style block `style_id`, if present.
    fn remove_inline_style(&self, style_id: &str);

    /// Write the document-level theme marker, e.g. `data-theme="dark"`.
    fn set_theme_marker(&self, attribute: &str, value: &str);
}

/// A sink that accepts everything and renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStyleSink;

#[async_trait]
impl StyleSink for NoopStyleSink {
    async fn load_stylesheet(&self, _path: &str, _link_id: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn remove_stylesheet(&self, _link_id: &str) {}

    fn inject_inline_style(&self, _css: &str, _style_id: &str) {}

    fn remove_inline_style(&self, _style_id: &str) {}

    fn set_theme_marker(&self, _attribute: &str, _value: &str) {}
}
