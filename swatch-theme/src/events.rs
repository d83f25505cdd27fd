//! Engine lifecycle events and their subscription bus.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use crate::error::ThemeError;
use crate::theme::Theme;

/// The event channels a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A theme was applied.
    Change,
    /// A theme finished loading.
    Load,
    /// A theme could not be loaded or found.
    Error,
    /// A failed switch fell back to the active theme.
    Revert,
}

/// What triggered a theme change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    /// An explicit request.
    User,
    /// The configured default theme.
    System,
    /// The persisted preference.
    Storage,
}

/// Payload of [EventKind::Change].
#[derive(Debug, Clone)]
pub struct ThemeChangeEvent {
    /// The theme that was current before, if any.
    pub previous_theme: Option<String>,
    /// The theme that is current now.
    pub current_theme: String,
    /// The applied theme object, for programmatic and ad-hoc themes.
    pub theme_object: Option<Arc<Theme>>,
    /// When the change was applied.
    pub timestamp: SystemTime,
    /// What triggered the change.
    pub source: ChangeSource,
}

/// Payload of [EventKind::Load].
#[derive(Debug, Clone)]
pub struct ThemeLoadEvent {
    /// The loaded theme.
    pub theme_id: String,
    /// When loading finished.
    pub timestamp: SystemTime,
}

/// Payload of [EventKind::Error].
#[derive(Debug, Clone)]
pub struct ThemeErrorEvent {
    /// The theme that failed.
    pub theme_id: String,
    /// The failure.
    pub error: ThemeError,
}

/// Payload of [EventKind::Revert].
#[derive(Debug, Clone)]
pub struct ThemeRevertEvent {
    /// The theme that was requested.
    pub attempted: String,
    /// The theme that stayed active.
    pub reverted_to: String,
    /// Why the request failed.
    pub error: ThemeError,
}

/// An event delivered to listeners.
#[derive(Debug, Clone)]
pub enum ThemeEvent {
    /// See [ThemeChangeEvent].
    Change(ThemeChangeEvent),
    /// See [ThemeLoadEvent].
    Load(ThemeLoadEvent),
    /// See [ThemeErrorEvent].
    Error(ThemeErrorEvent),
    /// See [ThemeRevertEvent].
    Revert(ThemeRevertEvent),
}

impl ThemeEvent {
    /// The channel this event is delivered on.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Change(_) => EventKind::Change,
            Self::Load(_) => EventKind::Load,
            Self::Error(_) => EventKind::Error,
            Self::Revert(_) => EventKind::Revert,
        }
    }
}

/// Handle returned by [EventBus::subscribe], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A subscribed callback.
pub type Listener = Arc<dyn Fn(&ThemeEvent) + Send + Sync>;

/// Per-kind listener lists with panic isolation.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<EventKind, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kind`.
    pub fn subscribe(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().entry(kind).or_default().push((id, listener));
        id
    }

    /// Remove a listener. Returns whether it was registered for `kind`.
    pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        before != list.len()
    }

    /// Number of listeners for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener of its kind.
    ///
    /// Listeners run outside the lock, so they may subscribe or unsubscribe.
    /// A panicking listener is logged and does not affect the others.
    pub fn emit(&self, event: &ThemeEvent) {
        let listeners: Vec<Listener> = match self.lock().get(&event.kind()) {
            Some(list) => list.iter().map(|(_, listener)| Arc::clone(listener)).collect(),
            None => return,
        };

        for listener in listeners {
            if panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                log::warn!("Theme {:?} listener panicked", event.kind());
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventKind, Vec<(ListenerId, Listener)>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
