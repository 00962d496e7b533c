//! In-memory RDF triple storage used by the Harmoniq plugin catalog.
//!
//! The catalog only needs a narrow slice of a graph database: inserting
//! triples, matching triple patterns, streaming one store into another and
//! evaluating small basic-graph-pattern queries. Any backend implementing
//! [`TripleStore`] can be plugged in through a [`StoreFactory`].

mod query;
mod store;
mod triple;
pub mod turtle;
pub mod uri;
mod value;

pub use query::{var, Query, QueryResults, Row, Term};
pub use store::{
    DefaultStoreFactory, IndexedStore, OpenedStore, SimpleStore, StorageBackend, StoreContext,
    StoreError, StoreFactory, StoreOptions, TripleStore, TripleStream,
};
pub use triple::{Triple, TriplePattern};
pub use turtle::ParseError;
pub use value::{Literal, Value};
