use harmoniq_rdf::Value;
use serde::{Deserialize, Serialize};

use crate::registry::Keyed;

/// A plugin found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    uri: Value,
    bundle_uri: Value,
    data_uris: Vec<Value>,
    extension_uri: Option<Value>,
}

impl Plugin {
    pub fn new(uri: Value, bundle_uri: Value) -> Self {
        Self {
            uri,
            bundle_uri,
            data_uris: Vec::new(),
            extension_uri: None,
        }
    }

    pub fn uri(&self) -> &Value {
        &self.uri
    }

    /// Directory URI of the bundle that declared this plugin.
    pub fn bundle_uri(&self) -> &Value {
        &self.bundle_uri
    }

    /// Every metadata resource describing this plugin, in discovery order.
    /// Not deduplicated: a resource reachable twice is listed twice.
    pub fn data_uris(&self) -> &[Value] {
        &self.data_uris
    }

    /// The dynamic manifest binary this plugin was synthesized by, if any.
    pub fn extension_uri(&self) -> Option<&Value> {
        self.extension_uri.as_ref()
    }

    pub(crate) fn push_data_uri(&mut self, data_uri: Value) {
        self.data_uris.push(data_uri);
    }

    pub(crate) fn set_extension_uri(&mut self, binary: Value) {
        self.extension_uri = Some(binary);
    }
}

impl Keyed for Plugin {
    fn key(&self) -> &Value {
        &self.uri
    }
}

/// A node of the plugin class taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginClass {
    uri: Value,
    parent_uri: Option<Value>,
    label: String,
}

impl PluginClass {
    pub fn new(uri: Value, parent_uri: Option<Value>, label: impl Into<String>) -> Self {
        Self {
            uri,
            parent_uri,
            label: label.into(),
        }
    }

    pub fn uri(&self) -> &Value {
        &self.uri
    }

    /// The first parent seen for this class; `None` only for the root.
    pub fn parent_uri(&self) -> Option<&Value> {
        self.parent_uri.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Keyed for PluginClass {
    fn key(&self) -> &Value {
        &self.uri
    }
}
