use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Triple, TriplePattern, Value};

pub type TripleStream<'a> = Box<dyn Iterator<Item = Triple> + 'a>;

/// Storage strategies a [`StoreFactory`] can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Subject-ordered tree storage with an optional object index.
    Indexed,
    /// Insertion-ordered list with a hash set for duplicate suppression.
    Simple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub backend: StorageBackend,
    pub index_spo: bool,
    pub index_ops: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Indexed,
            index_spo: true,
            index_ops: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("indexed storage requires the {0} index")]
    MissingIndex(&'static str),
    #[error("{0:?} storage is not available")]
    Unavailable(StorageBackend),
}

/// Minimal graph store contract used by the catalog.
pub trait TripleStore: fmt::Debug + Send {
    fn backend(&self) -> StorageBackend;

    /// Insert a triple, returning `false` if it was already present.
    fn insert(&mut self, triple: Triple) -> bool;

    fn contains(&self, triple: &Triple) -> bool;

    fn find<'a>(&'a self, pattern: &'a TriplePattern) -> TripleStream<'a>;

    /// Stream every triple in the store.
    fn stream(&self) -> TripleStream<'_>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn add(&mut self, subject: Value, predicate: Value, object: Value) -> bool {
        self.insert(Triple::new(subject, predicate, object))
    }

    /// Copy every triple of `other` into this store. Returns the number of
    /// triples that were not already present.
    fn merge_from(&mut self, other: &dyn TripleStore) -> usize {
        let mut added = 0;
        for triple in other.stream() {
            if self.insert(triple) {
                added += 1;
            }
        }
        added
    }
}

type Index = BTreeMap<Value, BTreeMap<Value, BTreeSet<Value>>>;

fn index_insert(index: &mut Index, first: Value, second: Value, third: Value) -> bool {
    index
        .entry(first)
        .or_default()
        .entry(second)
        .or_default()
        .insert(third)
}

fn index_scan<'a>(
    index: &'a Index,
    first: Option<&'a Value>,
    second: Option<&'a Value>,
    third: Option<&'a Value>,
) -> impl Iterator<Item = (&'a Value, &'a Value, &'a Value)> + 'a {
    let firsts: Box<dyn Iterator<Item = (&'a Value, &'a BTreeMap<Value, BTreeSet<Value>>)> + 'a> =
        match first {
            Some(key) => Box::new(index.get_key_value(key).into_iter()),
            None => Box::new(index.iter()),
        };
    firsts.flat_map(move |(a, seconds)| {
        let seconds: Box<dyn Iterator<Item = (&'a Value, &'a BTreeSet<Value>)> + 'a> =
            match second {
                Some(key) => Box::new(seconds.get_key_value(key).into_iter()),
                None => Box::new(seconds.iter()),
            };
        seconds.flat_map(move |(b, thirds)| {
            let thirds: Box<dyn Iterator<Item = &'a Value> + 'a> = match third {
                Some(key) => Box::new(thirds.get(key).into_iter()),
                None => Box::new(thirds.iter()),
            };
            thirds.map(move |c| (a, b, c))
        })
    })
}

fn owned(subject: &Value, predicate: &Value, object: &Value) -> Triple {
    Triple::new(subject.clone(), predicate.clone(), object.clone())
}

/// Tree-indexed storage. Subject lookups and full streams come out in
/// subject order; object lookups use the `ops` index when enabled.
#[derive(Debug, Default)]
pub struct IndexedStore {
    spo: Index,
    ops: Option<Index>,
    len: usize,
}

impl IndexedStore {
    pub fn new() -> Self {
        Self {
            spo: Index::new(),
            ops: Some(Index::new()),
            len: 0,
        }
    }

    pub fn with_options(options: &StoreOptions) -> Result<Self, StoreError> {
        if !options.index_spo {
            return Err(StoreError::MissingIndex("spo"));
        }
        Ok(Self {
            spo: Index::new(),
            ops: options.index_ops.then(Index::new),
            len: 0,
        })
    }
}

impl TripleStore for IndexedStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Indexed
    }

    fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;
        let inserted = match &mut self.ops {
            Some(ops) => {
                let inserted = index_insert(
                    &mut self.spo,
                    subject.clone(),
                    predicate.clone(),
                    object.clone(),
                );
                if inserted {
                    index_insert(ops, object, predicate, subject);
                }
                inserted
            }
            None => index_insert(&mut self.spo, subject, predicate, object),
        };
        if inserted {
            self.len += 1;
        }
        inserted
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.spo
            .get(&triple.subject)
            .and_then(|predicates| predicates.get(&triple.predicate))
            .is_some_and(|objects| objects.contains(&triple.object))
    }

    fn find<'a>(&'a self, pattern: &'a TriplePattern) -> TripleStream<'a> {
        let subject = pattern.subject.as_ref();
        let predicate = pattern.predicate.as_ref();
        let object = pattern.object.as_ref();
        match (&self.ops, subject, object) {
            (Some(ops), None, Some(_)) => Box::new(
                index_scan(ops, object, predicate, None).map(|(o, p, s)| owned(s, p, o)),
            ),
            _ => Box::new(
                index_scan(&self.spo, subject, predicate, object).map(|(s, p, o)| owned(s, p, o)),
            ),
        }
    }

    fn stream(&self) -> TripleStream<'_> {
        Box::new(index_scan(&self.spo, None, None, None).map(|(s, p, o)| owned(s, p, o)))
    }

    fn len(&self) -> usize {
        self.len
    }
}

/// Insertion-ordered storage without indexes.
#[derive(Debug, Default)]
pub struct SimpleStore {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
}

impl SimpleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TripleStore for SimpleStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Simple
    }

    fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    fn contains(&self, triple: &Triple) -> bool {
        self.seen.contains(triple)
    }

    fn find<'a>(&'a self, pattern: &'a TriplePattern) -> TripleStream<'a> {
        Box::new(
            self.triples
                .iter()
                .filter(move |triple| pattern.matches(triple))
                .cloned(),
        )
    }

    fn stream(&self) -> TripleStream<'_> {
        Box::new(self.triples.iter().cloned())
    }

    fn len(&self) -> usize {
        self.triples.len()
    }
}

/// Creates stores on demand. Implementations may refuse a backend, in which
/// case [`StoreContext::open`] falls back to [`StorageBackend::Simple`].
pub trait StoreFactory: fmt::Debug + Send + Sync {
    fn create(
        &self,
        backend: StorageBackend,
        options: &StoreOptions,
    ) -> Result<Box<dyn TripleStore>, StoreError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStoreFactory;

impl StoreFactory for DefaultStoreFactory {
    fn create(
        &self,
        backend: StorageBackend,
        options: &StoreOptions,
    ) -> Result<Box<dyn TripleStore>, StoreError> {
        match backend {
            StorageBackend::Indexed => Ok(Box::new(IndexedStore::with_options(options)?)),
            StorageBackend::Simple => Ok(Box::new(SimpleStore::new())),
        }
    }
}

/// A freshly created store together with the reason the requested backend
/// was replaced, if it was.
#[derive(Debug)]
pub struct OpenedStore {
    pub store: Box<dyn TripleStore>,
    pub fallback: Option<StoreError>,
}

/// Shared environment stores are created from.
#[derive(Debug)]
pub struct StoreContext {
    factory: Box<dyn StoreFactory>,
    options: StoreOptions,
}

impl StoreContext {
    pub fn new(options: StoreOptions) -> Self {
        Self::with_factory(DefaultStoreFactory, options)
    }

    pub fn with_factory(factory: impl StoreFactory + 'static, options: StoreOptions) -> Self {
        Self {
            factory: Box::new(factory),
            options,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn open(&self) -> Result<OpenedStore, StoreError> {
        match self.factory.create(self.options.backend, &self.options) {
            Ok(store) => Ok(OpenedStore {
                store,
                fallback: None,
            }),
            Err(err) if self.options.backend != StorageBackend::Simple => {
                let store = self
                    .factory
                    .create(StorageBackend::Simple, &self.options)?;
                Ok(OpenedStore {
                    store,
                    fallback: Some(err),
                })
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for StoreContext {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn uri(value: &str) -> Value {
        Value::uri(value)
    }

    fn sample(store: &mut dyn TripleStore) {
        store.add(uri("urn:b"), uri("urn:p"), uri("urn:x"));
        store.add(uri("urn:a"), uri("urn:p"), uri("urn:x"));
        store.add(uri("urn:a"), uri("urn:q"), Value::literal("label"));
        store.add(uri("urn:c"), uri("urn:p"), uri("urn:y"));
    }

    #[test]
    fn indexed_store_streams_in_subject_order() {
        let mut store = IndexedStore::new();
        sample(&mut store);
        let subjects: Vec<_> = store.stream().map(|t| t.subject.as_str().to_owned()).collect();
        assert_eq!(subjects, vec!["urn:a", "urn:a", "urn:b", "urn:c"]);
    }

    #[test]
    fn simple_store_streams_in_insertion_order() {
        let mut store = SimpleStore::new();
        sample(&mut store);
        let subjects: Vec<_> = store.stream().map(|t| t.subject.as_str().to_owned()).collect();
        assert_eq!(subjects, vec!["urn:b", "urn:a", "urn:a", "urn:c"]);
    }

    #[test]
    fn duplicate_triples_are_ignored() {
        let stores: Vec<Box<dyn TripleStore>> =
            vec![Box::new(IndexedStore::new()), Box::new(SimpleStore::new())];
        for mut store in stores {
            assert!(store.add(uri("urn:a"), uri("urn:p"), uri("urn:x")));
            assert!(!store.add(uri("urn:a"), uri("urn:p"), uri("urn:x")));
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn object_lookup_matches_across_backends() {
        let pattern = TriplePattern::new(None, Some(uri("urn:p")), Some(uri("urn:x")));
        let mut indexed = IndexedStore::new();
        let mut without_ops = IndexedStore::with_options(&StoreOptions {
            index_ops: false,
            ..StoreOptions::default()
        })
        .unwrap();
        let mut simple = SimpleStore::new();
        sample(&mut indexed);
        sample(&mut without_ops);
        sample(&mut simple);

        let mut expected: Vec<_> = simple.find(&pattern).collect();
        expected.sort();
        assert_eq!(indexed.find(&pattern).collect::<Vec<_>>(), expected);
        assert_eq!(without_ops.find(&pattern).collect::<Vec<_>>(), expected);
        assert_eq!(expected.len(), 2);
    }

    #[test]
    fn merge_counts_new_triples_only() {
        let mut target = IndexedStore::new();
        target.add(uri("urn:a"), uri("urn:p"), uri("urn:x"));
        let mut source = SimpleStore::new();
        sample(&mut source);
        assert_eq!(target.merge_from(&source), 3);
        assert_eq!(target.len(), 4);
        assert!(target.contains(&Triple::new(uri("urn:c"), uri("urn:p"), uri("urn:y"))));
    }

    #[derive(Debug)]
    struct NoIndexedStorage;

    impl StoreFactory for NoIndexedStorage {
        fn create(
            &self,
            backend: StorageBackend,
            options: &StoreOptions,
        ) -> Result<Box<dyn TripleStore>, StoreError> {
            match backend {
                StorageBackend::Indexed => Err(StoreError::Unavailable(backend)),
                StorageBackend::Simple => DefaultStoreFactory.create(backend, options),
            }
        }
    }

    #[test]
    fn context_falls_back_to_simple_storage() {
        let context = StoreContext::with_factory(NoIndexedStorage, StoreOptions::default());
        let opened = context.open().unwrap();
        assert_eq!(opened.store.backend(), StorageBackend::Simple);
        assert!(matches!(
            opened.fallback,
            Some(StoreError::Unavailable(StorageBackend::Indexed))
        ));
    }

    #[test]
    fn missing_spo_index_degrades_default_factory() {
        let context = StoreContext::new(StoreOptions {
            index_spo: false,
            ..StoreOptions::default()
        });
        let opened = context.open().unwrap();
        assert_eq!(opened.store.backend(), StorageBackend::Simple);
        assert!(matches!(opened.fallback, Some(StoreError::MissingIndex("spo"))));
    }

    #[test]
    fn requested_backend_is_used_when_available() {
        let opened = StoreContext::default().open().unwrap();
        assert_eq!(opened.store.backend(), StorageBackend::Indexed);
        assert!(opened.fallback.is_none());
    }
}
