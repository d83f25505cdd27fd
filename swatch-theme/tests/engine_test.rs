use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use swatch_theme::prelude::*;

#[derive(Default)]
struct RecordingSink {
    loads: Mutex<Vec<String>>,
    links: Mutex<HashSet<String>>,
    inline: Mutex<HashMap<String, String>>,
    marker: Mutex<Option<(String, String)>>,
    failing: Mutex<HashSet<String>>,
    stalled: Mutex<HashSet<String>>,
}

impl RecordingSink {
    fn fail_path(&self, path: &str) {
        self.failing.lock().unwrap().insert(path.to_string());
    }

    fn heal_path(&self, path: &str) {
        self.failing.lock().unwrap().remove(path);
    }

    fn stall_path(&self, path: &str) {
        self.stalled.lock().unwrap().insert(path.to_string());
    }

    fn unstall_path(&self, path: &str) {
        self.stalled.lock().unwrap().remove(path);
    }

    fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap().clone()
    }

    fn load_count(&self, path: &str) -> usize {
        self.loads().iter().filter(|p| *p == path).count()
    }

    fn has_link(&self, link_id: &str) -> bool {
        self.links.lock().unwrap().contains(link_id)
    }

    fn inline_style(&self, style_id: &str) -> Option<String> {
        self.inline.lock().unwrap().get(style_id).cloned()
    }

    fn marker(&self) -> Option<String> {
        self.marker.lock().unwrap().as_ref().map(|(_, value)| value.clone())
    }
}

#[async_trait]
impl StyleSink for RecordingSink {
    async fn load_stylesheet(&self, path: &str, link_id: &str) -> Result<(), SinkError> {
        self.loads.lock().unwrap().push(path.to_string());
        let stalled = self.stalled.lock().unwrap().contains(path);
        let delay = if stalled { Duration::from_secs(60) } else { Duration::from_millis(10) };
        tokio::time::sleep(delay).await;

        if self.failing.lock().unwrap().contains(path) {
            return Err(SinkError::Rejected {
                link_id: link_id.to_string(),
                details: "404 Not Found".to_string(),
            });
        }
        self.links.lock().unwrap().insert(link_id.to_string());
        Ok(())
    }

    fn remove_stylesheet(&self, link_id: &str) {
        self.links.lock().unwrap().remove(link_id);
    }

    fn inject_inline_style(&self, css: &str, style_id: &str) {
        self.inline.lock().unwrap().insert(style_id.to_string(), css.to_string());
    }

    fn remove_inline_style(&self, style_id: &str) {
        self.inline.lock().unwrap().remove(style_id);
    }

    fn set_theme_marker(&self, attribute: &str, value: &str) {
        *self.marker.lock().unwrap() = Some((attribute.to_string(), value.to_string()));
    }
}

#[derive(Default)]
struct MapStorage(Mutex<HashMap<String, String>>);

impl ThemeStorage for MapStorage {
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.0.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.0.lock().unwrap().remove(key);
        Ok(())
    }
}

type Events = Arc<Mutex<Vec<ThemeEvent>>>;

fn engine(sink: &Arc<RecordingSink>, definitions: Vec<ThemeDefinition>) -> ThemeEngine {
    let engine = ThemeEngine::new(ThemeEngineConfig::default(), sink.clone());
    engine.initialize(ThemeCatalog::from_definitions(definitions));
    engine
}

fn record(engine: &ThemeEngine) -> Events {
    let events: Events = Arc::default();
    for kind in [EventKind::Change, EventKind::Load, EventKind::Error, EventKind::Revert] {
        let events = events.clone();
        engine.on(kind, move |event| events.lock().unwrap().push(event.clone()));
    }
    events
}

fn count(events: &Events, kind: EventKind) -> usize {
    events.lock().unwrap().iter().filter(|e| e.kind() == kind).count()
}

fn low_contrast_theme() -> Theme {
    let mut theme = Theme::light();
    theme.palette.colors.insert(
        "primary".to_string(),
        PaletteColor::new("#b7b7b7", "#d0d0d0", "#8a8a8a", "#ffffff"),
    );
    theme
}

#[tokio::test]
async fn test_set_stylesheet_theme() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("ocean", "Ocean")]);
    let events = record(&engine);

    engine.set_theme("ocean", SetThemeOptions::default()).await.unwrap();

    assert_eq!(engine.get_current_theme().as_deref(), Some("ocean"));
    assert!(engine.is_theme_loaded("ocean"));
    assert!(engine.get_active_theme().is_none());
    assert_eq!(sink.loads(), vec!["/themes/ocean.css"]);
    assert!(sink.has_link("swatch-theme-ocean"));
    assert_eq!(sink.marker().as_deref(), Some("ocean"));
    assert_eq!(count(&events, EventKind::Load), 1);
    assert_eq!(count(&events, EventKind::Change), 1);
}

#[tokio::test]
async fn test_missing_theme_reverts_to_current() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("a", "A")]);
    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    let events = record(&engine);

    engine.set_theme("missing-theme", SetThemeOptions::default()).await.unwrap();

    assert_eq!(engine.get_current_theme().as_deref(), Some("a"));
    assert_eq!(count(&events, EventKind::Error), 1);
    assert_eq!(count(&events, EventKind::Revert), 1);
    let events = events.lock().unwrap();
    let revert = events.iter().find_map(|e| match e {
        ThemeEvent::Revert(revert) => Some(revert.clone()),
        _ => None,
    });
    let revert = revert.unwrap();
    assert_eq!(revert.attempted, "missing-theme");
    assert_eq!(revert.reverted_to, "a");
    assert_eq!(revert.error.code(), ThemeErrorCode::ThemeNotFound);
}

#[tokio::test]
async fn test_missing_theme_without_current_errors() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("a", "A")]);

    let err = engine.set_theme("missing-theme", SetThemeOptions::default()).await.unwrap_err();
    assert_eq!(err, ThemeError::not_found("missing-theme"));
    assert!(engine.get_current_theme().is_none());
}

#[tokio::test]
async fn test_without_fallback_returns_error() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("a", "A")]);
    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();

    let result = engine
        .set_theme("missing-theme", SetThemeOptions::default().without_fallback())
        .await;
    assert!(result.is_err());
    assert_eq!(engine.get_current_theme().as_deref(), Some("a"));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_load() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("x", "X")]);
    let events = record(&engine);

    let (first, second) = tokio::join!(
        engine.set_theme("x", SetThemeOptions::default()),
        engine.set_theme("x", SetThemeOptions::default()),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(sink.load_count("/themes/x.css"), 1);
    assert_eq!(engine.get_current_theme().as_deref(), Some("x"));
    assert_eq!(count(&events, EventKind::Load), 1);
    assert_eq!(count(&events, EventKind::Change), 1);
}

#[tokio::test]
async fn test_concurrent_requests_across_tasks() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("x", "X")]);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.set_theme("x", SetThemeOptions::default()).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(sink.load_count("/themes/x.css"), 1);
    assert_eq!(engine.get_current_theme().as_deref(), Some("x"));
}

#[tokio::test]
async fn test_current_theme_is_not_reloaded() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("a", "A")]);
    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    let events = record(&engine);

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();

    assert_eq!(sink.load_count("/themes/a.css"), 1);
    assert_eq!(count(&events, EventKind::Change), 0);
    assert_eq!(count(&events, EventKind::Load), 0);
}

#[tokio::test]
async fn test_low_contrast_theme_is_still_applied() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![ThemeDefinition::programmatic("grey", "Grey", ThemeFactory::new(low_contrast_theme))],
    );

    assert!(!engine.validator().validate(&low_contrast_theme(), None).valid);
    engine.set_theme("grey", SetThemeOptions::default()).await.unwrap();

    assert_eq!(engine.get_current_theme().as_deref(), Some("grey"));
    assert!(engine.get_active_theme().is_some());
    let css = sink.inline_style("swatch-js-theme-styles").unwrap();
    assert!(css.contains("--swatch-primary: #b7b7b7;"));
    assert_eq!(sink.marker().as_deref(), Some("grey"));
}

#[tokio::test]
async fn test_failed_theme_is_not_retried_until_cleared() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_path("/themes/broken.css");
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("broken", "Broken")]);

    let err = engine.set_theme("broken", SetThemeOptions::default()).await.unwrap_err();
    assert_eq!(err.code(), ThemeErrorCode::ThemeLoadFailed);
    assert!(!err.is_previously_failed());
    assert!(engine.has_failed_theme("broken"));
    assert_eq!(engine.cache().stats().size, 0);

    let err = engine.set_theme("broken", SetThemeOptions::default()).await.unwrap_err();
    assert!(err.is_previously_failed());
    assert_eq!(sink.load_count("/themes/broken.css"), 1);

    sink.heal_path("/themes/broken.css");
    assert!(engine.clear_failed_theme("broken"));
    engine.set_theme("broken", SetThemeOptions::default()).await.unwrap();

    assert_eq!(sink.load_count("/themes/broken.css"), 2);
    assert_eq!(engine.get_current_theme().as_deref(), Some("broken"));
    assert!(engine.failed_themes().is_empty());
}

#[tokio::test]
async fn test_clear_failed_themes_allows_every_retry() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_path("/themes/a.css");
    sink.fail_path("/themes/b.css");
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A"),
            ThemeDefinition::stylesheet("b", "B"),
        ],
    );

    assert!(engine.set_theme("a", SetThemeOptions::default()).await.is_err());
    assert!(engine.set_theme("b", SetThemeOptions::default()).await.is_err());
    assert_eq!(engine.failed_themes(), vec!["a", "b"]);

    let err = engine.set_theme("a", SetThemeOptions::default()).await.unwrap_err();
    assert!(err.is_previously_failed());

    sink.heal_path("/themes/a.css");
    sink.heal_path("/themes/b.css");
    engine.clear_failed_themes();
    assert!(engine.failed_themes().is_empty());
    assert!(!engine.has_failed_theme("a"));

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    engine.set_theme("b", SetThemeOptions::default()).await.unwrap();
    assert_eq!(sink.load_count("/themes/a.css"), 2);
    assert_eq!(sink.load_count("/themes/b.css"), 2);
    assert_eq!(engine.get_current_theme().as_deref(), Some("b"));
}

#[tokio::test]
async fn test_repeated_failures_notify_once() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_path("/themes/broken.css");
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A"),
            ThemeDefinition::stylesheet("broken", "Broken"),
        ],
    );
    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    let events = record(&engine);

    let (first, second) = tokio::join!(
        engine.set_theme("broken", SetThemeOptions::default()),
        engine.set_theme("broken", SetThemeOptions::default()),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(sink.load_count("/themes/broken.css"), 1);
    assert_eq!(count(&events, EventKind::Error), 1);
    assert_eq!(count(&events, EventKind::Revert), 1);
    assert_eq!(engine.get_current_theme().as_deref(), Some("a"));

    engine
        .set_theme("broken", SetThemeOptions::default().force())
        .await
        .unwrap();
    assert_eq!(sink.load_count("/themes/broken.css"), 2);
    assert_eq!(count(&events, EventKind::Error), 2);
    assert_eq!(count(&events, EventKind::Revert), 2);
}

#[tokio::test]
async fn test_dependencies_load_first() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("brand", "Brand").with_dependencies(["base"]),
            ThemeDefinition::stylesheet("base", "Base").with_dependencies(["tokens"]),
            ThemeDefinition::stylesheet("tokens", "Tokens"),
        ],
    );

    engine.set_theme("brand", SetThemeOptions::default()).await.unwrap();

    assert_eq!(
        sink.loads(),
        vec!["/themes/tokens.css", "/themes/base.css", "/themes/brand.css"]
    );
    assert!(engine.is_theme_loaded("tokens"));
    assert!(engine.is_theme_loaded("base"));
    assert_eq!(engine.get_current_theme().as_deref(), Some("brand"));
    assert_eq!(sink.marker().as_deref(), Some("brand"));
}

#[tokio::test]
async fn test_switching_away_detaches_dependencies() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("brand", "Brand").with_dependencies(["base"]),
            ThemeDefinition::stylesheet("partner", "Partner").with_dependencies(["base"]),
            ThemeDefinition::stylesheet("base", "Base"),
            ThemeDefinition::stylesheet("plain", "Plain"),
        ],
    );

    engine.set_theme("brand", SetThemeOptions::default()).await.unwrap();
    engine.set_theme("partner", SetThemeOptions::default()).await.unwrap();
    assert!(!sink.has_link("swatch-theme-brand"));
    assert!(sink.has_link("swatch-theme-base"));
    assert!(sink.has_link("swatch-theme-partner"));
    assert_eq!(sink.load_count("/themes/base.css"), 1);

    engine.set_theme("plain", SetThemeOptions::default()).await.unwrap();
    assert!(!sink.has_link("swatch-theme-partner"));
    assert!(!sink.has_link("swatch-theme-base"));
    assert!(sink.has_link("swatch-theme-plain"));
    assert!(!engine.is_theme_loaded("base"));
    assert!(!engine.is_theme_loaded("partner"));

    engine.set_theme("brand", SetThemeOptions::default()).await.unwrap();
    assert!(sink.has_link("swatch-theme-base"));
    assert!(sink.has_link("swatch-theme-brand"));
    assert!(!sink.has_link("swatch-theme-plain"));
    assert_eq!(sink.load_count("/themes/base.css"), 2);
}

#[tokio::test]
async fn test_failed_dependency_fails_theme() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_path("/themes/base.css");
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("brand", "Brand").with_dependencies(["base"]),
            ThemeDefinition::stylesheet("base", "Base"),
        ],
    );

    let err = engine.set_theme("brand", SetThemeOptions::default()).await.unwrap_err();
    assert_eq!(err.code(), ThemeErrorCode::ThemeLoadFailed);
    assert!(engine.has_failed_theme("brand"));
    assert!(engine.has_failed_theme("base"));
    assert_eq!(sink.load_count("/themes/brand.css"), 0);
}

#[tokio::test]
async fn test_circular_dependency_is_reported() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A").with_dependencies(["b"]),
            ThemeDefinition::stylesheet("b", "B").with_dependencies(["a"]),
        ],
    );

    let err = engine.set_theme("a", SetThemeOptions::default()).await.unwrap_err();
    assert_eq!(err.code(), ThemeErrorCode::CircularDependency);
    assert!(sink.loads().is_empty());
}

#[tokio::test]
async fn test_preload_does_not_apply() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A"),
            ThemeDefinition::stylesheet("b", "B"),
        ],
    );
    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    let events = record(&engine);

    engine.preload_theme("b").await.unwrap();
    assert!(engine.is_theme_loaded("b"));
    assert_eq!(engine.get_current_theme().as_deref(), Some("a"));
    assert_eq!(count(&events, EventKind::Change), 0);
    assert_eq!(count(&events, EventKind::Load), 1);

    engine.set_theme("b", SetThemeOptions::default()).await.unwrap();
    assert_eq!(sink.load_count("/themes/b.css"), 1);
    assert_eq!(engine.get_current_theme().as_deref(), Some("b"));
}

#[tokio::test]
async fn test_switching_kinds_swaps_artifacts() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("ocean", "Ocean").with_class("theme-ocean"),
            ThemeDefinition::programmatic("midnight", "Midnight", ThemeFactory::new(Theme::dark)),
        ],
    );

    engine.set_theme("ocean", SetThemeOptions::default()).await.unwrap();
    assert_eq!(sink.marker().as_deref(), Some("theme-ocean"));

    engine.set_theme("midnight", SetThemeOptions::default()).await.unwrap();
    assert!(!sink.has_link("swatch-theme-ocean"));
    assert!(sink.inline_style("swatch-js-theme-styles").is_some());
    assert!(!engine.is_theme_loaded("ocean"));

    engine.set_theme("ocean", SetThemeOptions::default()).await.unwrap();
    assert!(sink.inline_style("swatch-js-theme-styles").is_none());
    assert!(sink.has_link("swatch-theme-ocean"));
    assert_eq!(sink.load_count("/themes/ocean.css"), 2);
}

#[tokio::test]
async fn test_keep_previous_leaves_artifacts() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A"),
            ThemeDefinition::stylesheet("b", "B"),
        ],
    );

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    engine
        .set_theme("b", SetThemeOptions::default().keep_previous())
        .await
        .unwrap();

    assert!(sink.has_link("swatch-theme-a"));
    assert!(sink.has_link("swatch-theme-b"));
}

#[tokio::test]
async fn test_custom_path_and_explicit_path() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A").with_css_path("/assets/a-theme.css"),
            ThemeDefinition::stylesheet("b", "B"),
        ],
    );

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    engine
        .set_theme("b", SetThemeOptions::default().with_custom_path("/preview/b.css"))
        .await
        .unwrap();

    assert_eq!(sink.loads(), vec!["/assets/a-theme.css", "/preview/b.css"]);
}

#[tokio::test]
async fn test_programmatic_theme_uses_cache_on_reload() {
    let sink = Arc::new(RecordingSink::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let factory = ThemeFactory::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Theme::dark()
    });
    let engine = engine(&sink, vec![ThemeDefinition::programmatic("midnight", "Midnight", factory)]);

    engine.set_theme("midnight", SetThemeOptions::default()).await.unwrap();
    engine
        .set_theme("midnight", SetThemeOptions::default().force())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.cache().stats().js_themes, 1);
    assert!(engine.registry().get_theme("midnight").is_some());
}

#[tokio::test]
async fn test_async_factory_failure() {
    let sink = Arc::new(RecordingSink::default());
    let factory = ThemeFactory::from_async(|| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Err::<Theme, _>(anyhow::anyhow!("token service unavailable"))
    });
    let engine = engine(&sink, vec![ThemeDefinition::programmatic("remote", "Remote", factory)]);

    let err = engine.set_theme("remote", SetThemeOptions::default()).await.unwrap_err();
    match err {
        ThemeError::ThemeLoadFailed { id, reason, .. } => {
            assert_eq!(id, "remote");
            assert!(reason.contains("token service unavailable"));
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_theme_object_is_applied_directly() {
    let sink = Arc::new(RecordingSink::default());
    let storage = Arc::new(MapStorage::default());
    let engine = ThemeEngine::builder().sink(sink.clone()).storage(storage.clone()).build();
    let events = record(&engine);

    engine
        .set_theme(Theme::dark().with_name("preview"), SetThemeOptions::default())
        .await
        .unwrap();

    assert_eq!(engine.get_current_theme().as_deref(), Some("preview"));
    assert_eq!(sink.marker().as_deref(), Some("preview"));
    assert!(sink.inline_style("swatch-js-theme-styles").is_some());
    assert_eq!(count(&events, EventKind::Change), 1);
    assert!(storage.get("swatch-theme").unwrap().is_none());

    engine.set_theme(Theme::light(), SetThemeOptions::default()).await.unwrap();
    assert_eq!(engine.get_current_theme().as_deref(), Some("light"));
}

#[tokio::test]
async fn test_theme_object_named_like_registered_theme() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("ocean", "Ocean"),
            ThemeDefinition::stylesheet("sand", "Sand"),
        ],
    );

    engine.set_theme("ocean", SetThemeOptions::default()).await.unwrap();
    engine
        .set_theme(Theme::light().with_name("ocean"), SetThemeOptions::default())
        .await
        .unwrap();
    assert!(!sink.has_link("swatch-theme-ocean"));
    assert!(sink.inline_style("swatch-js-theme-styles").is_some());
    assert!(!engine.is_theme_loaded("ocean"));

    // Selecting the registered theme replaces the object of the same name.
    engine.set_theme("ocean", SetThemeOptions::default()).await.unwrap();
    assert!(sink.has_link("swatch-theme-ocean"));
    assert!(sink.inline_style("swatch-js-theme-styles").is_none());
    assert!(engine.get_active_theme().is_none());
    assert_eq!(sink.load_count("/themes/ocean.css"), 2);

    engine
        .set_theme(Theme::dark().with_name("ocean"), SetThemeOptions::default())
        .await
        .unwrap();
    engine.set_theme("sand", SetThemeOptions::default()).await.unwrap();
    assert!(!sink.has_link("swatch-theme-ocean"));
    assert!(sink.has_link("swatch-theme-sand"));
    assert!(sink.inline_style("swatch-js-theme-styles").is_none());
    assert_eq!(sink.marker().as_deref(), Some("sand"));
}

#[tokio::test]
async fn test_abandoned_load_releases_engine() {
    let sink = Arc::new(RecordingSink::default());
    sink.stall_path("/themes/slow.css");
    sink.stall_path("/themes/stuck.css");
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("slow", "Slow"),
            ThemeDefinition::stylesheet("stuck", "Stuck"),
        ],
    );

    let timed_out = tokio::time::timeout(
        Duration::from_millis(20),
        engine.set_theme("slow", SetThemeOptions::default()),
    )
    .await;
    assert!(timed_out.is_err());
    assert!(engine.get_current_theme().is_none());

    // A later request starts a fresh load instead of joining the dropped one.
    sink.unstall_path("/themes/slow.css");
    engine.set_theme("slow", SetThemeOptions::default()).await.unwrap();
    assert_eq!(sink.load_count("/themes/slow.css"), 2);
    assert_eq!(engine.get_current_theme().as_deref(), Some("slow"));

    let timed_out = tokio::time::timeout(
        Duration::from_millis(20),
        engine.set_theme("stuck", SetThemeOptions::default()),
    )
    .await;
    assert!(timed_out.is_err());

    drop(engine);
    assert_eq!(Arc::strong_count(&sink), 1);
}

#[tokio::test]
async fn test_persist_and_restore() {
    let storage = Arc::new(MapStorage::default());
    let definitions = || {
        ThemeCatalog::from_definitions([
            ThemeDefinition::stylesheet("a", "A"),
            ThemeDefinition::stylesheet("b", "B"),
        ])
    };
    let config = ThemeEngineConfig {
        default_theme: Some("a".to_string()),
        ..Default::default()
    };

    let first = ThemeEngine::builder()
        .config(config.clone())
        .sink(Arc::new(RecordingSink::default()))
        .storage(storage.clone())
        .build();
    first.initialize(definitions());
    assert_eq!(first.restore_theme().await.unwrap().as_deref(), Some("a"));
    first.set_theme("b", SetThemeOptions::default()).await.unwrap();
    assert_eq!(storage.get("swatch-theme").unwrap().as_deref(), Some("b"));

    let second = ThemeEngine::builder()
        .config(config)
        .sink(Arc::new(RecordingSink::default()))
        .storage(storage.clone())
        .build();
    second.initialize(definitions());
    let sources = Arc::new(Mutex::new(Vec::new()));
    let seen = sources.clone();
    second.on(EventKind::Change, move |event| {
        if let ThemeEvent::Change(change) = event {
            seen.lock().unwrap().push(change.source);
        }
    });

    assert_eq!(second.restore_theme().await.unwrap().as_deref(), Some("b"));
    assert_eq!(*sources.lock().unwrap(), vec![ChangeSource::Storage]);
}

#[tokio::test]
async fn test_restore_ignores_unregistered_stored_theme() {
    let storage = Arc::new(MapStorage::default());
    storage.set("swatch-theme", "retired").unwrap();
    let engine = ThemeEngine::builder()
        .config(ThemeEngineConfig {
            default_theme: Some("a".to_string()),
            ..Default::default()
        })
        .storage(storage)
        .build();
    engine.initialize(ThemeCatalog::from_definitions([ThemeDefinition::stylesheet("a", "A")]));

    assert_eq!(engine.restore_theme().await.unwrap().as_deref(), Some("a"));
}

#[tokio::test]
async fn test_panicking_listener_does_not_break_engine() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(&sink, vec![ThemeDefinition::stylesheet("a", "A")]);
    engine.on(EventKind::Change, |_| panic!("listener bug"));
    let events = record(&engine);

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    assert_eq!(count(&events, EventKind::Change), 1);
    assert_eq!(engine.get_current_theme().as_deref(), Some("a"));
}

#[tokio::test]
async fn test_off_removes_listener() {
    let sink = Arc::new(RecordingSink::default());
    let engine = engine(
        &sink,
        vec![
            ThemeDefinition::stylesheet("a", "A"),
            ThemeDefinition::stylesheet("b", "B"),
        ],
    );
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = changes.clone();
    let id = engine.on(EventKind::Change, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    assert!(engine.off(EventKind::Change, id));
    engine.set_theme("b", SetThemeOptions::default()).await.unwrap();

    assert_eq!(changes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disabled_cache_still_loads() {
    let sink = Arc::new(RecordingSink::default());
    let config = ThemeEngineConfig {
        enable_cache: false,
        ..Default::default()
    };
    let engine = ThemeEngine::new(config, sink.clone());
    engine.initialize(ThemeCatalog::from_definitions([ThemeDefinition::stylesheet("a", "A")]));

    engine.set_theme("a", SetThemeOptions::default()).await.unwrap();
    assert!(engine.cache().is_empty());
    assert!(engine.is_theme_loaded("a"));
}
