use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use harmoniq_rdf::StoreOptions;
use serde::{Deserialize, Serialize};

use crate::path::SearchPath;
use crate::WorldError;

/// Environment variable holding an explicit LV2 search path.
pub const LV2_PATH_VAR: &str = "LV2_PATH";

#[cfg(target_os = "macos")]
pub const DEFAULT_LV2_PATH: &str = "~/Library/Audio/Plug-Ins/LV2:~/.lv2:/usr/local/lib/lv2:/usr/lib/lv2:/Library/Audio/Plug-Ins/LV2";
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_LV2_PATH: &str = "~/.lv2:/usr/local/lib/lv2:/usr/lib/lv2";

/// Settings controlling how a [`World`](crate::World) discovers and stores
/// plugin metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Explicit colon-separated bundle directories. Never word-expanded.
    pub search_path: Option<String>,
    /// Used when neither `search_path` nor `LV2_PATH` is set. Each entry
    /// goes through shell-style word expansion.
    pub default_search_path: String,
    pub store: StoreOptions,
    /// Allow bundles to run dynamic manifest binaries in-process.
    pub dynamic_manifests: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            search_path: None,
            default_search_path: DEFAULT_LV2_PATH.to_owned(),
            store: StoreOptions::default(),
            dynamic_manifests: true,
        }
    }
}

impl WorldConfig {
    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    pub fn settings_path() -> Option<PathBuf> {
        let mut base = dirs::config_dir()?;
        base.push("HarmoniqStudio");
        base.push("plugin-world.json");
        Some(base)
    }

    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Load the persisted settings, falling back to defaults when they are
    /// missing or unreadable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "failed to load plugin world settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), WorldError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// The directories to scan: the explicit setting, then `LV2_PATH`, then
    /// the expanded default list.
    pub fn resolve_search_path(&self) -> SearchPath {
        if let Some(explicit) = &self.search_path {
            return SearchPath::explicit(explicit);
        }
        match env::var(LV2_PATH_VAR) {
            Ok(value) => SearchPath::explicit(&value),
            Err(_) => SearchPath::expanded(&self.default_search_path),
        }
    }
}
