use harmoniq_plugin_world::{FoldOutcome, Keyed, Registry, Value};
use proptest::prelude::*;

#[derive(Clone, Debug)]
struct Entry {
    uri: Value,
    rows: usize,
}

impl Keyed for Entry {
    fn key(&self) -> &Value {
        &self.uri
    }
}

fn fold_all(keys: &[String]) -> Registry<Entry> {
    let mut registry = Registry::new();
    for key in keys {
        let (_, entry) = registry.fold(key, || Entry {
            uri: Value::uri(key.clone()),
            rows: 0,
        });
        entry.rows += 1;
    }
    registry
}

fn key_strategy() -> impl Strategy<Value = String> {
    "urn:[a-e]{1,3}"
}

proptest! {
    #[test]
    fn shuffled_rows_fold_into_a_sorted_unique_registry(
        keys in prop::collection::vec(key_strategy(), 0..64).prop_shuffle()
    ) {
        let registry = fold_all(&keys);
        let folded: Vec<&str> = registry.iter().map(|entry| entry.uri.as_str()).collect();

        let mut expected: Vec<&str> = keys.iter().map(String::as_str).collect();
        expected.sort_unstable();
        expected.dedup();
        prop_assert_eq!(&folded, &expected);

        let rows: usize = registry.iter().map(|entry| entry.rows).sum();
        prop_assert_eq!(rows, keys.len());
        for key in &keys {
            prop_assert!(registry.get_by_uri(key).is_some());
        }
    }

    #[test]
    fn ordered_rows_never_resort(
        mut keys in prop::collection::vec(key_strategy(), 1..64)
    ) {
        keys.sort();
        let mut registry = Registry::new();
        for key in &keys {
            let (outcome, _) = registry.fold(key, || Entry {
                uri: Value::uri(key.clone()),
                rows: 0,
            });
            prop_assert!(matches!(outcome, FoldOutcome::Appended | FoldOutcome::Coalesced));
        }
        prop_assert!(registry
            .iter()
            .zip(registry.iter().skip(1))
            .all(|(a, b)| a.uri.as_str() < b.uri.as_str()));
    }
}
