use std::fmt;

use crate::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Value,
    pub predicate: Value,
    pub object: Value,
}

impl Triple {
    pub fn new(subject: Value, predicate: Value, object: Value) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// A triple with optional wildcards. `None` matches any node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriplePattern {
    pub subject: Option<Value>,
    pub predicate: Option<Value>,
    pub object: Option<Value>,
}

impl TriplePattern {
    pub fn new(subject: Option<Value>, predicate: Option<Value>, object: Option<Value>) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    pub fn any() -> Self {
        Self::default()
    }

    pub fn matches(&self, triple: &Triple) -> bool {
        fn slot(pattern: &Option<Value>, value: &Value) -> bool {
            pattern.as_ref().map_or(true, |expected| expected == value)
        }
        slot(&self.subject, &triple.subject)
            && slot(&self.predicate, &triple.predicate)
            && slot(&self.object, &triple.object)
    }
}
