use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use harmoniq_rdf::{StorageBackend, StoreContext, TripleStore, Value};

use crate::extension::{DynamicLibraryProvider, ExtensionProvider};
use crate::indexer;
use crate::path::SearchPath;
use crate::plugin::{Plugin, PluginClass};
use crate::registry::{PluginClasses, Plugins};
use crate::vocab::Vocabulary;
use crate::{WorldConfig, WorldError};

/// The plugin catalog: one RDF store holding every loaded bundle plus the
/// plugin and class registries extracted from it.
///
/// Fields drop in declaration order: registries, cached nodes, then the
/// store. A caller-supplied [`StoreContext`] is only released, never torn
/// down, since other owners may still hold it.
pub struct World {
    plugins: Plugins,
    plugin_classes: PluginClasses,
    root_class: PluginClass,
    pub(crate) vocab: Vocabulary,
    pub(crate) extension_binaries: HashSet<String>,
    pub(crate) store: Box<dyn TripleStore>,
    pub(crate) context: Arc<StoreContext>,
    pub(crate) config: WorldConfig,
    pub(crate) extensions: Box<dyn ExtensionProvider>,
    loaded: bool,
}

impl World {
    /// Create an empty world with its own store context built from
    /// `config.store`.
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        let context = Arc::new(StoreContext::new(config.store.clone()));
        Self::with_context(context, config)
    }

    /// Create an empty world whose stores come from `context`. The
    /// context's own options take precedence over `config.store`.
    pub fn with_context(context: Arc<StoreContext>, config: WorldConfig) -> Result<Self, WorldError> {
        let opened = context.open()?;
        if let Some(err) = &opened.fallback {
            tracing::warn!(
                ?err,
                requested = ?context.options().backend,
                using = ?opened.store.backend(),
                "triple storage fell back to a simpler backend"
            );
        }

        let vocab = Vocabulary::new();
        let root_class = PluginClass::new(vocab.lv2_plugin.clone(), None, "Plugin");
        Ok(Self {
            plugins: Plugins::new(),
            plugin_classes: PluginClasses::new(),
            root_class,
            vocab,
            extension_binaries: HashSet::new(),
            store: opened.store,
            context,
            config,
            extensions: Box::new(DynamicLibraryProvider),
            loaded: false,
        })
    }

    /// Replace the provider used to run dynamic manifest binaries.
    pub fn with_extension_provider(mut self, provider: impl ExtensionProvider + 'static) -> Self {
        self.extensions = Box::new(provider);
        self
    }

    /// Discover, load and index every bundle on the configured search path.
    /// Only the first call does anything.
    pub fn load_all(&mut self) {
        if self.loaded {
            tracing::debug!("plugin world already loaded");
            return;
        }
        let search_path = self.config.resolve_search_path();
        self.load_search_path(&search_path);
        self.index();
        self.loaded = true;
        tracing::info!(
            plugins = self.plugins.len(),
            classes = self.plugin_classes.len(),
            "plugin world loaded"
        );
    }

    /// Load every bundle under the directories of a colon-separated list,
    /// taken verbatim. Registries of an already loaded world are rebuilt.
    pub fn load_path(&mut self, list: &str) {
        self.load_search_path(&SearchPath::explicit(list));
        if self.loaded {
            self.index();
        }
    }

    fn load_search_path(&mut self, search_path: &SearchPath) {
        for bundle in search_path.discover_bundles() {
            if let Err(err) = self.load_bundle(&bundle) {
                tracing::warn!(?err, %bundle, "skipping bundle");
            }
        }
    }

    fn index(&mut self) {
        for resource in indexer::specification_resources(&*self.store, &self.vocab) {
            if let Err(err) = self.load_file(&resource) {
                tracing::warn!(?err, %resource, "failed to load specification data");
            }
        }
        self.plugin_classes = indexer::plugin_classes(&*self.store, &self.vocab);
        self.plugins = indexer::plugins(&*self.store, &self.vocab, &self.extension_binaries);
    }

    pub fn plugins(&self) -> &Plugins {
        &self.plugins
    }

    pub fn plugin_classes(&self) -> &PluginClasses {
        &self.plugin_classes
    }

    /// The root of the class taxonomy, `lv2:Plugin`.
    pub fn plugin_class(&self) -> &PluginClass {
        &self.root_class
    }

    /// A new collection of the plugins accepted by `include`.
    pub fn plugins_by_filter<P>(&self, include: P) -> Plugins
    where
        P: FnMut(&Plugin) -> bool,
    {
        self.plugins.filter(include)
    }

    pub fn plugin(&self, uri: &str) -> Option<&Plugin> {
        self.plugins.get_by_uri(uri)
    }

    pub fn store(&self) -> &dyn TripleStore {
        &*self.store
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.store.backend()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Binaries whose dynamic manifests were merged into the store.
    pub fn extension_binaries(&self) -> impl Iterator<Item = Value> + '_ {
        self.extension_binaries.iter().map(Value::uri)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("plugins", &self.plugins.len())
            .field("plugin_classes", &self.plugin_classes.len())
            .field("triples", &self.store.len())
            .field("backend", &self.store.backend())
            .field("loaded", &self.loaded)
            .finish()
    }
}
