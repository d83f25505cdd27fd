// SPDX-License-Identifier: LGPL-3.0-only

//! Host-side collaborators for the swatch theme engine.
//!
//! [SettingsRegistry] layers `engine.toml` files from the XDG directories
//! into an engine configuration and theme catalog. [CollectingStyleSink]
//! gathers style artifacts for server rendering. [FileStorage] and
//! [MemoryStorage] persist the selected theme.

pub mod settings;
pub mod sink;
pub mod storage;

// Re-export the collaborators most hosts wire into an engine
pub use settings::{SettingsRegistry, ThemeEntry};
pub use sink::CollectingStyleSink;
pub use storage::{FileStorage, MemoryStorage};
