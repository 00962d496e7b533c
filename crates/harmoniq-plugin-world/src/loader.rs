//! Loading bundles into the global store.
//!
//! All of a bundle's triples are collected in a scratch store first, so a
//! bundle that fails part way leaves nothing behind.

use harmoniq_rdf::{turtle, uri, var, Query, TripleStore, Value};

use crate::vocab::MANIFEST_FILE;
use crate::{ExtensionError, World, WorldError};

impl World {
    /// Load the manifest of the bundle at `bundle` (a directory URI with a
    /// trailing slash), expand any dynamic manifests it declares and merge
    /// the result into the world.
    pub fn load_bundle(&mut self, bundle: &Value) -> Result<(), WorldError> {
        let Some(bundle_uri) = bundle.as_uri() else {
            tracing::error!(%bundle, "bundle reference is not a URI");
            return Err(WorldError::NotAUri(bundle.clone()));
        };
        let manifest_uri = uri::resolve(bundle_uri, MANIFEST_FILE).map_err(|err| WorldError::InvalidUri {
            uri: bundle_uri.to_owned(),
            reason: err.to_string(),
        })?;

        let mut manifest = self.scratch_store()?;
        turtle::parse_resource(&manifest_uri, &mut *manifest).map_err(|source| WorldError::Parse {
            uri: manifest_uri.clone(),
            source,
        })?;

        if self.config.dynamic_manifests {
            self.expand_dynamic_manifests(bundle_uri, &mut *manifest);
        }

        let manifest_value = Value::uri(manifest_uri);
        for kind in [&self.vocab.lv2_plugin, &self.vocab.lv2_specification] {
            for subject in subjects_of_type(&*manifest, &self.vocab.rdf_type, kind) {
                self.store.add(
                    subject.clone(),
                    self.vocab.rdfs_see_also.clone(),
                    manifest_value.clone(),
                );
                self.store
                    .add(subject, self.vocab.bundle_uri.clone(), bundle.clone());
            }
        }

        let added = self.store.merge_from(&*manifest);
        tracing::debug!(bundle = bundle_uri, triples = added, "loaded bundle");
        Ok(())
    }

    /// Parse a single Turtle resource straight into the world. Returns the
    /// number of new triples.
    pub fn load_file(&mut self, resource: &str) -> Result<usize, WorldError> {
        let mut scratch = self.scratch_store()?;
        turtle::parse_resource(resource, &mut *scratch).map_err(|source| WorldError::Parse {
            uri: resource.to_owned(),
            source,
        })?;
        Ok(self.store.merge_from(&*scratch))
    }

    fn scratch_store(&self) -> Result<Box<dyn TripleStore>, WorldError> {
        let opened = self.context.open()?;
        if let Some(err) = opened.fallback {
            tracing::debug!(?err, "scratch store fell back to simple storage");
        }
        Ok(opened.store)
    }

    /// Run every `dynman:DynManifest` binary declared in `manifest` and merge
    /// what it describes back into `manifest`. A binary that fails is
    /// skipped without affecting the others.
    fn expand_dynamic_manifests(&mut self, bundle_uri: &str, manifest: &mut dyn TripleStore) {
        let binaries: Vec<Value> = Query::select(["binary"])
            .distinct()
            .pattern(var("dynman"), &self.vocab.rdf_type, &self.vocab.dyn_manifest)
            .pattern(var("dynman"), &self.vocab.lv2_binary, var("binary"))
            .execute(&*manifest)
            .filter_map(|row| row.get(0).filter(|binary| binary.is_uri()).cloned())
            .collect();

        for binary in binaries {
            let generated = match self.run_dynamic_manifest(bundle_uri, &binary) {
                Ok(generated) => generated,
                Err(err) => {
                    tracing::warn!(?err, %binary, "skipping dynamic manifest");
                    continue;
                }
            };
            for plugin in subjects_of_type(&*generated, &self.vocab.rdf_type, &self.vocab.lv2_plugin) {
                manifest.add(plugin, self.vocab.rdfs_see_also.clone(), binary.clone());
            }
            manifest.merge_from(&*generated);
            self.extension_binaries.insert(binary.as_str().to_owned());
        }
    }

    fn run_dynamic_manifest(
        &self,
        bundle_uri: &str,
        binary: &Value,
    ) -> Result<Box<dyn TripleStore>, WorldError> {
        let mut output = Vec::new();
        {
            let mut extension = self.extensions.acquire(binary)?;
            extension.write_subjects(&mut output)?;
        }
        let text = String::from_utf8(output).map_err(ExtensionError::from)?;

        let mut generated = self.scratch_store()?;
        turtle::parse_str(&text, bundle_uri, &mut *generated).map_err(|source| WorldError::Parse {
            uri: binary.as_str().to_owned(),
            source,
        })?;
        Ok(generated)
    }
}

fn subjects_of_type(store: &dyn TripleStore, rdf_type: &Value, kind: &Value) -> Vec<Value> {
    Query::select(["subject"])
        .distinct()
        .pattern(var("subject"), rdf_type, kind)
        .execute(store)
        .filter_map(|row| row.get(0).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use harmoniq_rdf::{Triple, TriplePattern};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::WorldConfig;

    fn world() -> World {
        let config = WorldConfig {
            dynamic_manifests: false,
            ..WorldConfig::default()
        };
        World::new(config).unwrap()
    }

    #[test]
    fn non_uri_bundle_is_rejected_without_mutation() {
        let mut world = world();
        let err = world.load_bundle(&Value::literal("/usr/lib/lv2/amp.lv2")).unwrap_err();
        assert!(matches!(err, WorldError::NotAUri(_)));
        assert!(world.store().is_empty());
    }

    #[test]
    fn missing_manifest_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        let mut world = world();
        let bundle = Value::uri(uri::directory_uri(dir.path()).unwrap());
        let err = world.load_bundle(&bundle).unwrap_err();
        assert!(matches!(err, WorldError::Parse { .. }));
        assert!(world.store().is_empty());
    }

    #[test]
    fn broken_manifest_leaves_store_untouched() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "<urn:amp> a <http://lv2plug.in/ns/lv2core#Plugin> .\n<urn:amp> broken",
        )
        .unwrap();
        let mut world = world();
        let bundle = Value::uri(uri::directory_uri(dir.path()).unwrap());
        assert!(world.load_bundle(&bundle).is_err());
        assert!(world.store().is_empty());
    }

    #[test]
    fn specifications_are_annotated_like_plugins() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILE),
            "@prefix lv2: <http://lv2plug.in/ns/lv2core#> .\n\
             <http://lv2plug.in/ns/ext/atom> a lv2:Specification .\n",
        )
        .unwrap();
        let mut world = world();
        let bundle = Value::uri(uri::directory_uri(dir.path()).unwrap());
        world.load_bundle(&bundle).unwrap();

        let spec = Value::uri("http://lv2plug.in/ns/ext/atom");
        let vocab = world.vocabulary().clone();
        let bundle_links: Vec<Triple> = world
            .store()
            .find(&TriplePattern::new(Some(spec.clone()), Some(vocab.bundle_uri.clone()), None))
            .collect();
        assert_eq!(bundle_links, vec![Triple::new(spec.clone(), vocab.bundle_uri, bundle.clone())]);
        let manifest = Value::uri(format!("{}{MANIFEST_FILE}", bundle.as_str()));
        assert!(world
            .store()
            .contains(&Triple::new(spec, vocab.rdfs_see_also, manifest)));
    }

    #[test]
    fn load_file_merges_a_single_resource() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atom.ttl");
        fs::write(&path, "<urn:atom> <urn:label> \"Atom\" .").unwrap();
        let mut world = world();
        let resource = uri::file_uri(&path).unwrap();
        assert_eq!(world.load_file(&resource).unwrap(), 1);
        assert_eq!(world.load_file(&resource).unwrap(), 0);
    }
}
