use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{TriplePattern, TripleStore, Value};

/// One slot of a query pattern: either a variable or a fixed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Var(String),
    Value(Value),
}

pub fn var(name: &str) -> Term {
    Term::Var(name.to_owned())
}

impl From<Value> for Term {
    fn from(value: Value) -> Self {
        Term::Value(value)
    }
}

impl From<&Value> for Term {
    fn from(value: &Value) -> Self {
        Term::Value(value.clone())
    }
}

type Bindings = HashMap<String, Value>;

/// A conjunctive triple-pattern query, evaluated as a nested-loop join in
/// pattern order.
///
/// ```
/// use harmoniq_rdf::{var, IndexedStore, Query, TripleStore, Value};
///
/// let mut store = IndexedStore::new();
/// store.add(Value::uri("urn:amp"), Value::uri("urn:type"), Value::uri("urn:Plugin"));
///
/// let query = Query::select(["plugin"])
///     .distinct()
///     .pattern(var("plugin"), Value::uri("urn:type"), Value::uri("urn:Plugin"));
/// let rows: Vec<_> = query.execute(&store).collect();
/// assert_eq!(rows[0].get(0), Some(&Value::uri("urn:amp")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    select: Vec<String>,
    patterns: Vec<[Term; 3]>,
    distinct: bool,
}

impl Query {
    pub fn select<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            select: variables.into_iter().map(Into::into).collect(),
            patterns: Vec::new(),
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn pattern(
        mut self,
        subject: impl Into<Term>,
        predicate: impl Into<Term>,
        object: impl Into<Term>,
    ) -> Self {
        self.patterns
            .push([subject.into(), predicate.into(), object.into()]);
        self
    }

    pub fn execute(&self, store: &dyn TripleStore) -> QueryResults {
        let mut solutions = vec![Bindings::new()];
        for [subject, predicate, object] in &self.patterns {
            let mut extended = Vec::new();
            for solution in &solutions {
                let pattern = TriplePattern::new(
                    resolve(subject, solution),
                    resolve(predicate, solution),
                    resolve(object, solution),
                );
                for triple in store.find(&pattern) {
                    let mut candidate = solution.clone();
                    if bind(&mut candidate, subject, &triple.subject)
                        && bind(&mut candidate, predicate, &triple.predicate)
                        && bind(&mut candidate, object, &triple.object)
                    {
                        extended.push(candidate);
                    }
                }
            }
            solutions = extended;
            if solutions.is_empty() {
                break;
            }
        }

        let names: Arc<[String]> = self.select.clone().into();
        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(solutions.len());
        for solution in solutions {
            let values: Vec<Option<Value>> =
                names.iter().map(|name| solution.get(name).cloned()).collect();
            if self.distinct && !seen.insert(values.clone()) {
                continue;
            }
            rows.push(Row {
                names: Arc::clone(&names),
                values,
            });
        }
        QueryResults {
            rows: rows.into_iter(),
        }
    }
}

fn resolve(term: &Term, bindings: &Bindings) -> Option<Value> {
    match term {
        Term::Value(value) => Some(value.clone()),
        Term::Var(name) => bindings.get(name).cloned(),
    }
}

fn bind(bindings: &mut Bindings, term: &Term, value: &Value) -> bool {
    match term {
        Term::Value(_) => true,
        Term::Var(name) => match bindings.get(name) {
            Some(existing) => existing == value,
            None => {
                bindings.insert(name.clone(), value.clone());
                true
            }
        },
    }
}

/// A single result row, indexed in `SELECT` order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    names: Arc<[String]>,
    values: Vec<Option<Value>>,
}

impl Row {
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)?.as_ref()
    }

    pub fn binding(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|candidate| candidate == name)?;
        self.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug)]
pub struct QueryResults {
    rows: std::vec::IntoIter<Row>,
}

impl Iterator for QueryResults {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{IndexedStore, SimpleStore};

    fn uri(value: &str) -> Value {
        Value::uri(value)
    }

    fn catalog() -> IndexedStore {
        let mut store = IndexedStore::new();
        let kind = uri("urn:type");
        for plugin in ["urn:reverb", "urn:amp"] {
            store.add(uri(plugin), kind.clone(), uri("urn:Plugin"));
            store.add(uri(plugin), uri("urn:bundle"), uri("urn:bundle/one"));
        }
        store.add(uri("urn:amp"), uri("urn:data"), uri("urn:amp.ttl"));
        store.add(uri("urn:amp"), uri("urn:data"), uri("urn:amp-extra.ttl"));
        store.add(uri("urn:reverb"), uri("urn:data"), uri("urn:reverb.ttl"));
        store.add(uri("urn:spec"), kind, uri("urn:Specification"));
        store
    }

    #[test]
    fn join_binds_every_pattern() {
        let store = catalog();
        let query = Query::select(["plugin", "data", "bundle"])
            .distinct()
            .pattern(var("plugin"), uri("urn:type"), uri("urn:Plugin"))
            .pattern(var("plugin"), uri("urn:bundle"), var("bundle"))
            .pattern(var("plugin"), uri("urn:data"), var("data"));
        let rows: Vec<_> = query
            .execute(&store)
            .map(|row| {
                (
                    row.get(0).unwrap().as_str().to_owned(),
                    row.binding("data").unwrap().as_str().to_owned(),
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                ("urn:amp".to_owned(), "urn:amp-extra.ttl".to_owned()),
                ("urn:amp".to_owned(), "urn:amp.ttl".to_owned()),
                ("urn:reverb".to_owned(), "urn:reverb.ttl".to_owned()),
            ]
        );
    }

    #[test]
    fn distinct_collapses_projected_duplicates() {
        let store = catalog();
        let all = Query::select(["plugin"])
            .pattern(var("plugin"), uri("urn:data"), var("data"))
            .execute(&store)
            .count();
        let distinct = Query::select(["plugin"])
            .distinct()
            .pattern(var("plugin"), uri("urn:data"), var("data"))
            .execute(&store)
            .count();
        assert_eq!(all, 3);
        assert_eq!(distinct, 2);
    }

    #[test]
    fn repeated_variable_must_match_same_node() {
        let mut store = SimpleStore::new();
        store.add(uri("urn:a"), uri("urn:same"), uri("urn:a"));
        store.add(uri("urn:a"), uri("urn:same"), uri("urn:b"));
        let rows: Vec<_> = Query::select(["x"])
            .pattern(var("x"), uri("urn:same"), var("x"))
            .execute(&store)
            .collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&uri("urn:a")));
    }

    #[test]
    fn unmatched_pattern_yields_no_rows() {
        let store = catalog();
        let results = Query::select(["plugin"])
            .pattern(var("plugin"), uri("urn:type"), uri("urn:Plugin"))
            .pattern(var("plugin"), uri("urn:missing"), var("value"))
            .execute(&store);
        assert_eq!(results.count(), 0);
    }

    #[test]
    fn unknown_variable_is_unbound() {
        let store = catalog();
        let row = Query::select(["spec", "nothing"])
            .pattern(var("spec"), uri("urn:type"), uri("urn:Specification"))
            .execute(&store)
            .next()
            .unwrap();
        assert_eq!(row.get(0), Some(&uri("urn:spec")));
        assert_eq!(row.get(1), None);
        assert_eq!(row.binding("nothing"), None);
    }
}
