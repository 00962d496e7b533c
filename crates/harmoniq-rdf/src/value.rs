use std::fmt;

use serde::{Deserialize, Serialize};

/// A literal node: lexical form plus optional datatype or language tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub lexical: String,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

impl Literal {
    pub fn plain(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn tagged(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

/// A node stored in a triple.
///
/// Blank nodes only ever appear inside a store; the catalog keys everything
/// it exposes by URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
    Uri(String),
    Blank(String),
    Literal(Literal),
}

impl Value {
    pub fn uri(uri: impl Into<String>) -> Self {
        Value::Uri(uri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Value::Blank(id.into())
    }

    pub fn literal(lexical: impl Into<String>) -> Self {
        Value::Literal(Literal::plain(lexical))
    }

    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Value::Literal(Literal::typed(lexical, datatype))
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Value::Uri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Value::Literal(_))
    }

    pub fn as_uri(&self) -> Option<&str> {
        match self {
            Value::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Canonical string form, used for ordering and equality of keys.
    pub fn as_str(&self) -> &str {
        match self {
            Value::Uri(uri) => uri,
            Value::Blank(id) => id,
            Value::Literal(literal) => &literal.lexical,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Uri(uri) => write!(f, "<{uri}>"),
            Value::Blank(id) => write!(f, "_:{id}"),
            Value::Literal(literal) => {
                write!(f, "{:?}", literal.lexical)?;
                if let Some(language) = &literal.language {
                    write!(f, "@{language}")
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^<{datatype}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        Value::Literal(literal)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn canonical_form_ignores_node_kind() {
        assert_eq!(Value::uri("http://a").as_str(), "http://a");
        assert_eq!(Value::literal("hello").as_str(), "hello");
        assert_eq!(Value::blank("b0").as_str(), "b0");
    }

    #[test]
    fn display_uses_turtle_syntax() {
        assert_eq!(Value::uri("http://a").to_string(), "<http://a>");
        assert_eq!(
            Value::typed_literal("4", "http://www.w3.org/2001/XMLSchema#integer").to_string(),
            "\"4\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
        assert_eq!(
            Value::Literal(Literal::tagged("hi", "en")).to_string(),
            "\"hi\"@en"
        );
    }
}
