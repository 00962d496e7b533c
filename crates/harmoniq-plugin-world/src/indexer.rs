//! The three catalog queries run once every bundle is loaded.

use std::collections::HashSet;

use harmoniq_rdf::{var, Query, TripleStore, Value};

use crate::plugin::{Plugin, PluginClass};
use crate::registry::{PluginClasses, Plugins};
use crate::vocab::Vocabulary;

/// Data resources referenced by every `lv2:Specification`.
pub(crate) fn specification_resources(store: &dyn TripleStore, vocab: &Vocabulary) -> Vec<String> {
    Query::select(["spec", "data"])
        .distinct()
        .pattern(var("spec"), &vocab.rdf_type, &vocab.lv2_specification)
        .pattern(var("spec"), &vocab.rdfs_see_also, var("data"))
        .execute(store)
        .filter_map(|row| row.get(1).and_then(Value::as_uri).map(str::to_owned))
        .collect()
}

/// Fold the class taxonomy. Rows without a URI parent or a literal label are
/// dropped; a class with several parents keeps the first one seen.
pub(crate) fn plugin_classes(store: &dyn TripleStore, vocab: &Vocabulary) -> PluginClasses {
    let rows = Query::select(["class", "parent", "label"])
        .distinct()
        .pattern(var("class"), &vocab.rdf_type, &vocab.rdfs_class)
        .pattern(var("class"), &vocab.rdfs_sub_class_of, var("parent"))
        .pattern(var("class"), &vocab.rdfs_label, var("label"))
        .execute(store);

    let mut classes = PluginClasses::new();
    for row in rows {
        let (Some(class @ Value::Uri(_)), Some(parent @ Value::Uri(_)), Some(Value::Literal(label))) =
            (row.get(0), row.get(1), row.get(2))
        else {
            continue;
        };
        classes.fold(class.as_str(), || {
            PluginClass::new(class.clone(), Some(parent.clone()), label.lexical.clone())
        });
    }
    classes
}

/// Fold every plugin with its bundle and data resources. A data resource
/// that is one of `extension_binaries` becomes the plugin's extension URI.
pub(crate) fn plugins(
    store: &dyn TripleStore,
    vocab: &Vocabulary,
    extension_binaries: &HashSet<String>,
) -> Plugins {
    let rows = Query::select(["plugin", "data", "bundle"])
        .distinct()
        .pattern(var("plugin"), &vocab.rdf_type, &vocab.lv2_plugin)
        .pattern(var("plugin"), &vocab.bundle_uri, var("bundle"))
        .pattern(var("plugin"), &vocab.rdfs_see_also, var("data"))
        .execute(store);

    let mut plugins = Plugins::new();
    for row in rows {
        let (Some(uri @ Value::Uri(_)), Some(data @ Value::Uri(_)), Some(bundle @ Value::Uri(_))) =
            (row.get(0), row.get(1), row.get(2))
        else {
            continue;
        };
        let (_, plugin) = plugins.fold(uri.as_str(), || Plugin::new(uri.clone(), bundle.clone()));
        if extension_binaries.contains(data.as_str()) {
            plugin.set_extension_uri(data.clone());
        } else {
            plugin.push_data_uri(data.clone());
        }
    }
    plugins
}

#[cfg(test)]
mod tests {
    use harmoniq_rdf::{IndexedStore, SimpleStore};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::vocab::LV2;

    fn lv2(local: &str) -> Value {
        Value::uri(format!("{LV2}{local}"))
    }

    #[test]
    fn classes_without_label_or_parent_are_dropped() {
        let vocab = Vocabulary::new();
        let mut store = IndexedStore::new();
        for (class, label) in [("DelayPlugin", "Delay"), ("ReverbPlugin", "Reverb")] {
            store.add(lv2(class), vocab.rdf_type.clone(), vocab.rdfs_class.clone());
            store.add(lv2(class), vocab.rdfs_sub_class_of.clone(), lv2("Plugin"));
            store.add(lv2(class), vocab.rdfs_label.clone(), Value::literal(label));
        }
        store.add(lv2("Orphan"), vocab.rdf_type.clone(), vocab.rdfs_class.clone());
        store.add(lv2("Orphan"), vocab.rdfs_label.clone(), Value::literal("Orphan"));
        store.add(lv2("Unlabelled"), vocab.rdf_type.clone(), vocab.rdfs_class.clone());
        store.add(lv2("Unlabelled"), vocab.rdfs_sub_class_of.clone(), lv2("Plugin"));

        let classes = plugin_classes(&store, &vocab);
        let labels: Vec<_> = classes.iter().map(PluginClass::label).collect();
        assert_eq!(labels, vec!["Delay", "Reverb"]);
        assert_eq!(classes.get(0).unwrap().parent_uri(), Some(&lv2("Plugin")));
    }

    #[test]
    fn second_parent_is_ignored() {
        let vocab = Vocabulary::new();
        let mut store = SimpleStore::new();
        let class = lv2("SpectralPlugin");
        store.add(class.clone(), vocab.rdf_type.clone(), vocab.rdfs_class.clone());
        store.add(class.clone(), vocab.rdfs_sub_class_of.clone(), lv2("UtilityPlugin"));
        store.add(class.clone(), vocab.rdfs_sub_class_of.clone(), lv2("AnalyserPlugin"));
        store.add(class.clone(), vocab.rdfs_label.clone(), Value::literal("Spectral"));

        let classes = plugin_classes(&store, &vocab);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes.get(0).unwrap().parent_uri(), Some(&lv2("UtilityPlugin")));
    }

    #[test]
    fn extension_binaries_become_extension_uris() {
        let vocab = Vocabulary::new();
        let mut store = IndexedStore::new();
        let plugin = Value::uri("urn:amp");
        let bundle = Value::uri("file:///lv2/amp.lv2/");
        let binary = Value::uri("file:///lv2/amp.lv2/dyn.so");
        store.add(plugin.clone(), vocab.rdf_type.clone(), vocab.lv2_plugin.clone());
        store.add(plugin.clone(), vocab.bundle_uri.clone(), bundle.clone());
        store.add(plugin.clone(), vocab.rdfs_see_also.clone(), Value::uri("file:///lv2/amp.lv2/manifest.ttl"));
        store.add(plugin.clone(), vocab.rdfs_see_also.clone(), binary.clone());

        let binaries = HashSet::from([binary.as_str().to_owned()]);
        let plugins = plugins(&store, &vocab, &binaries);
        let amp = plugins.get_by_uri("urn:amp").unwrap();
        assert_eq!(amp.bundle_uri(), &bundle);
        assert_eq!(amp.extension_uri(), Some(&binary));
        assert_eq!(amp.data_uris(), &[Value::uri("file:///lv2/amp.lv2/manifest.ttl")]);
    }

    #[test]
    fn literal_data_and_bundles_are_ignored() {
        let vocab = Vocabulary::new();
        let mut store = IndexedStore::new();
        let amp = Value::uri("urn:amp");
        let bundle = Value::uri("file:///lv2/amp.lv2/");
        store.add(amp.clone(), vocab.rdf_type.clone(), vocab.lv2_plugin.clone());
        store.add(amp.clone(), vocab.bundle_uri.clone(), bundle.clone());
        store.add(amp.clone(), vocab.bundle_uri.clone(), Value::literal("amp.lv2"));
        store.add(amp.clone(), vocab.rdfs_see_also.clone(), Value::uri("file:///lv2/amp.lv2/amp.ttl"));
        store.add(amp, vocab.rdfs_see_also.clone(), Value::literal("amp.ttl"));
        let only_literal = Value::uri("urn:only-literal");
        store.add(only_literal.clone(), vocab.rdf_type.clone(), vocab.lv2_plugin.clone());
        store.add(only_literal.clone(), vocab.bundle_uri.clone(), bundle.clone());
        store.add(only_literal, vocab.rdfs_see_also.clone(), Value::literal("notes"));

        let plugins = plugins(&store, &vocab, &HashSet::new());
        assert_eq!(plugins.len(), 1);
        let amp = plugins.get_by_uri("urn:amp").unwrap();
        assert_eq!(amp.bundle_uri(), &bundle);
        assert_eq!(amp.data_uris(), &[Value::uri("file:///lv2/amp.lv2/amp.ttl")]);
    }

    #[test]
    fn specification_data_is_listed() {
        let vocab = Vocabulary::new();
        let mut store = IndexedStore::new();
        let spec = Value::uri("http://lv2plug.in/ns/ext/atom");
        store.add(spec.clone(), vocab.rdf_type.clone(), vocab.lv2_specification.clone());
        store.add(spec, vocab.rdfs_see_also.clone(), Value::uri("file:///lv2/atom.lv2/atom.ttl"));
        assert_eq!(
            specification_resources(&store, &vocab),
            vec!["file:///lv2/atom.lv2/atom.ttl".to_owned()]
        );
    }
}
