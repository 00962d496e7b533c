//! LV2 plugin catalog for Harmoniq Studio.
//!
//! A [`World`] walks the LV2 search path, merges every bundle's
//! `manifest.ttl` (and any dynamic manifest the bundle ships) into one RDF
//! store, then extracts sorted, duplicate-free registries of plugins and
//! plugin classes from it.
//!
//! ```no_run
//! use harmoniq_plugin_world::{World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default())?;
//! world.load_all();
//! for plugin in world.plugins() {
//!     println!("{}", plugin.uri().as_str());
//! }
//! # Ok::<(), harmoniq_plugin_world::WorldError>(())
//! ```

mod config;
mod error;
mod extension;
mod indexer;
mod loader;
mod path;
mod plugin;
mod registry;
pub mod vocab;
mod world;

pub use config::{WorldConfig, DEFAULT_LV2_PATH, LV2_PATH_VAR};
pub use error::{ExtensionError, WorldError};
pub use extension::{DynamicLibraryProvider, ExtensionProvider, ManifestExtension};
pub use harmoniq_rdf::{StorageBackend, StoreContext, StoreOptions, Value};
pub use path::{expand_words, scan_directory, SearchPath};
pub use plugin::{Plugin, PluginClass};
pub use registry::{FoldOutcome, Keyed, PluginClasses, Plugins, Registry};
pub use vocab::Vocabulary;
pub use world::World;

/// Serializes tests that read or write process environment variables.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
