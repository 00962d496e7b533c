//! Namespaces and the nodes the catalog queries with.

use harmoniq_rdf::Value;

pub const LV2: &str = "http://lv2plug.in/ns/lv2core#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const DYN_MANIFEST: &str = "http://lv2plug.in/ns/ext/dynmanifest#";
pub const SLV2: &str = "http://drobilla.net/ns/slv2#";

/// File name of the manifest inside every bundle.
pub const MANIFEST_FILE: &str = "manifest.ttl";

/// Nodes cached for the lifetime of a [`World`](crate::World).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    pub rdf_type: Value,
    pub lv2_plugin: Value,
    pub lv2_specification: Value,
    pub lv2_binary: Value,
    pub rdfs_see_also: Value,
    pub rdfs_class: Value,
    pub rdfs_sub_class_of: Value,
    pub rdfs_label: Value,
    pub bundle_uri: Value,
    pub dyn_manifest: Value,
    pub xsd_integer: Value,
    pub xsd_decimal: Value,
}

impl Vocabulary {
    pub fn new() -> Self {
        let term = |namespace: &str, local: &str| Value::uri(format!("{namespace}{local}"));
        Self {
            rdf_type: term(RDF, "type"),
            lv2_plugin: term(LV2, "Plugin"),
            lv2_specification: term(LV2, "Specification"),
            lv2_binary: term(LV2, "binary"),
            rdfs_see_also: term(RDFS, "seeAlso"),
            rdfs_class: term(RDFS, "Class"),
            rdfs_sub_class_of: term(RDFS, "subClassOf"),
            rdfs_label: term(RDFS, "label"),
            bundle_uri: term(SLV2, "bundleURI"),
            dyn_manifest: term(DYN_MANIFEST, "DynManifest"),
            xsd_integer: term(XSD, "integer"),
            xsd_decimal: term(XSD, "decimal"),
        }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}
