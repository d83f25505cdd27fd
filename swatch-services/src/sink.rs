// SPDX-License-Identifier: LGPL-3.0-only

//! Server-side style collection.
//!
//! [CollectingStyleSink] records everything the engine writes so a server
//! renderer can emit it into the `<head>` of a response. With a root
//! directory configured, stylesheets are read from disk and inlined.

use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use indexmap::IndexMap;
use smol::fs;
use swatch_theme::error::SinkError;
use swatch_theme::sink::StyleSink;

/// A stylesheet attached to the collected document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedStylesheet {
    /// The requested path.
    pub href: String,
    /// File contents, when the sink reads from a root directory.
    pub content: Option<String>,
}

#[derive(Debug, Default)]
struct Collected {
    stylesheets: IndexMap<String, CollectedStylesheet>,
    inline_styles: IndexMap<String, String>,
    marker: Option<(String, String)>,
}

/// A [StyleSink] that collects style artifacts instead of rendering them.
#[derive(Debug, Default)]
pub struct CollectingStyleSink {
    root: Option<PathBuf>,
    collected: Mutex<Collected>,
}

impl CollectingStyleSink {
    /// Create a sink that records stylesheet links without reading them.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink that resolves stylesheet paths below `root` and inlines them.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            collected: Mutex::default(),
        }
    }

    /// The attached stylesheets, keyed by link id, in attach order.
    pub fn stylesheets(&self) -> IndexMap<String, CollectedStylesheet> {
        self.collected().stylesheets.clone()
    }

    /// Whether the stylesheet `link_id` is attached.
    pub fn has_stylesheet(&self, link_id: &str) -> bool {
        self.collected().stylesheets.contains_key(link_id)
    }

    /// The contents of the inline style block `style_id`.
    pub fn inline_style(&self, style_id: &str) -> Option<String> {
        self.collected().inline_styles.get(style_id).cloned()
    }

    /// The theme marker as `(attribute, value)`.
    pub fn marker(&self) -> Option<(String, String)> {
        self.collected().marker.clone()
    }

    /// The marker rendered as an attribute for the root element, e.g. `data-theme="dark"`.
    pub fn root_attribute(&self) -> Option<String> {
        self.marker()
            .map(|(attribute, value)| format!("{}=\"{}\"", attribute, escape_attribute(&value)))
    }

    /// Render the collected styles as `<head>` markup.
    ///
    /// Stylesheets read from disk become `<style>` blocks, the rest become
    /// `<link>` elements. Inline style blocks follow the stylesheets.
    pub fn render_head(&self) -> String {
        let collected = self.collected();
        let mut html = String::new();

        for (link_id, stylesheet) in &collected.stylesheets {
            let id = escape_attribute(link_id);
            let href = escape_attribute(&stylesheet.href);
            match &stylesheet.content {
                Some(content) => {
                    html.push_str(&format!("<style id=\"{id}\" data-href=\"{href}\">\n{content}\n</style>\n"));
                },
                None => {
                    html.push_str(&format!("<link rel=\"stylesheet\" id=\"{id}\" href=\"{href}\">\n"));
                },
            }
        }

        for (style_id, css) in &collected.inline_styles {
            html.push_str(&format!("<style id=\"{}\">\n{}\n</style>\n", escape_attribute(style_id), css));
        }

        html
    }

    /// Forget everything collected so far.
    pub fn clear(&self) {
        *self.collected() = Collected::default();
    }

    fn collected(&self) -> MutexGuard<'_, Collected> {
        self.collected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(root: &Path, href: &str, link_id: &str) -> Result<PathBuf, SinkError> {
        let relative = Path::new(href.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(SinkError::Rejected {
                link_id: link_id.to_string(),
                details: format!("path {href:?} escapes the stylesheet root"),
            });
        }
        Ok(root.join(relative))
    }
}

#[async_trait]
impl StyleSink for CollectingStyleSink {
    async fn load_stylesheet(&self, path: &str, link_id: &str) -> Result<(), SinkError> {
        let content = match &self.root {
            Some(root) => {
                let file = Self::resolve(root, path, link_id)?;
                let css = fs::read_to_string(&file)
                    .await
                    .map_err(|source| SinkError::Io { path: file.clone(), source })?;
                log::debug!("Read stylesheet {:?} ({} bytes)", file, css.len());
                Some(css)
            },
            None => None,
        };

        self.collected().stylesheets.insert(
            link_id.to_string(),
            CollectedStylesheet {
                href: path.to_string(),
                content,
            },
        );
        Ok(())
    }

    fn remove_stylesheet(&self, link_id: &str) {
        self.collected().stylesheets.shift_remove(link_id);
    }

    fn inject_inline_style(&self, css: &str, style_id: &str) {
        self.collected()
            .inline_styles
            .insert(style_id.to_string(), css.to_string());
    }

    fn remove_inline_style(&self, style_id: &str) {
        self.collected().inline_styles.shift_remove(style_id);
    }

    fn set_theme_marker(&self, attribute: &str, value: &str) {
        self.collected().marker = Some((attribute.to_string(), value.to_string()));
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c => escaped.push(c),
        }
    }
    escaped
}
