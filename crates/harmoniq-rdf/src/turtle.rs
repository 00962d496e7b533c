//! Reader for the Turtle subset found in plugin bundles.
//!
//! Supported: `@prefix`/`@base` and their SPARQL spellings, IRIs resolved
//! against the document base, prefixed names, the `a` keyword, predicate
//! (`;`) and object (`,`) lists, labelled and anonymous blank nodes,
//! collections, short and long string literals with language tags or
//! datatypes, and numeric/boolean shorthand literals.
//!
//! Triples are inserted as they are read, so a document that fails halfway
//! leaves its leading triples behind. Parse into a scratch store when that
//! matters.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use url::Url;

use crate::{uri, Triple, TripleStore, Value};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

static DOCUMENTS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a local file resource")]
    NotLocal(String),
    #[error("invalid IRI {iri}: {source}")]
    Iri {
        iri: String,
        #[source]
        source: url::ParseError,
    },
}

/// Parse `text` into `store`, resolving relative IRIs against `base`.
/// Returns the number of triples that were new to the store.
pub fn parse_str(text: &str, base: &str, store: &mut dyn TripleStore) -> Result<usize, ParseError> {
    let base = Url::parse(base).map_err(|source| ParseError::Iri {
        iri: base.to_owned(),
        source,
    })?;
    Parser::new(text, base, store).run()
}

/// Read the `file:` resource and parse it with its own URI as the base.
pub fn parse_resource(resource: &str, store: &mut dyn TripleStore) -> Result<usize, ParseError> {
    let path = uri::file_uri_to_path(resource)
        .ok_or_else(|| ParseError::NotLocal(resource.to_owned()))?;
    let text = fs::read_to_string(&path).map_err(|source| ParseError::Io { path, source })?;
    let added = parse_str(&text, resource, store)?;
    tracing::trace!(resource, triples = added, "parsed Turtle resource");
    Ok(added)
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    base: Url,
    prefixes: HashMap<String, String>,
    blank_prefix: String,
    anonymous: usize,
    store: &'a mut dyn TripleStore,
    inserted: usize,
}

type ParseResult<T> = Result<T, ParseError>;

impl<'a> Parser<'a> {
    fn new(text: &str, base: Url, store: &'a mut dyn TripleStore) -> Self {
        let document = DOCUMENTS.fetch_add(1, Ordering::Relaxed);
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            base,
            prefixes: HashMap::new(),
            blank_prefix: format!("d{document}_"),
            anonymous: 0,
            store,
            inserted: 0,
        }
    }

    fn run(mut self) -> ParseResult<usize> {
        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some('@') => self.directive()?,
                Some(_) if self.at_keyword("PREFIX") => {
                    self.pos += "PREFIX".len();
                    self.prefix_decl()?;
                }
                Some(_) if self.at_keyword("BASE") => {
                    self.pos += "BASE".len();
                    self.base_decl()?;
                }
                Some(_) => {
                    self.triples()?;
                    self.expect('.')?;
                }
            }
        }
        Ok(self.inserted)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err(ParseError::Syntax {
            line: self.line,
            message: message.into(),
        })
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => self.error(format!("expected '{expected}', found '{c}'")),
            None => self.error(format!("expected '{expected}', found end of input")),
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        let mut offset = 0;
        for expected in keyword.chars() {
            match self.peek_at(offset) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => offset += 1,
                _ => return false,
            }
        }
        self.peek_at(offset).is_some_and(char::is_whitespace)
    }

    fn directive(&mut self) -> ParseResult<()> {
        self.bump();
        let mut word = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_alphabetic) {
            word.push(c);
            self.bump();
        }
        match word.as_str() {
            "prefix" => self.prefix_decl()?,
            "base" => self.base_decl()?,
            other => return self.error(format!("unknown directive @{other}")),
        }
        self.expect('.')
    }

    fn prefix_decl(&mut self) -> ParseResult<()> {
        self.skip_ws();
        let mut prefix = String::new();
        while let Some(c) = self.peek().filter(|&c| c != ':' && is_name_char(c)) {
            prefix.push(c);
            self.bump();
        }
        self.expect(':')?;
        self.skip_ws();
        let namespace = self.iriref()?;
        self.prefixes.insert(prefix, namespace);
        Ok(())
    }

    fn base_decl(&mut self) -> ParseResult<()> {
        self.skip_ws();
        let base = self.iriref()?;
        self.base = Url::parse(&base).map_err(|source| ParseError::Iri { iri: base, source })?;
        Ok(())
    }

    fn iriref(&mut self) -> ParseResult<String> {
        self.expect('<')?;
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('>') => break,
                Some(c) if c.is_whitespace() => return self.error("whitespace inside IRI"),
                Some(c) => raw.push(c),
                None => return self.error("unterminated IRI"),
            }
        }
        self.base
            .join(&raw)
            .map(String::from)
            .map_err(|source| ParseError::Iri { iri: raw, source })
    }

    fn read_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek().filter(|&c| is_name_char(c)) {
            name.push(c);
            self.bump();
        }
        // A trailing '.' terminates the statement, it is not part of the name.
        while name.ends_with('.') {
            name.pop();
            self.pos -= 1;
        }
        name
    }

    fn prefixed_name(&mut self) -> ParseResult<String> {
        let name = self.read_name();
        let Some((prefix, local)) = name.split_once(':') else {
            return match self.peek() {
                Some(c) if name.is_empty() => self.error(format!("unexpected '{c}'")),
                None if name.is_empty() => self.error("unexpected end of input"),
                _ => self.error(format!("expected a prefixed name, found '{name}'")),
            };
        };
        match self.prefixes.get(prefix) {
            Some(namespace) => Ok(format!("{namespace}{local}")),
            None => self.error(format!("undefined prefix '{prefix}:'")),
        }
    }

    fn iri(&mut self) -> ParseResult<Value> {
        if self.peek() == Some('<') {
            self.iriref().map(Value::Uri)
        } else {
            self.prefixed_name().map(Value::Uri)
        }
    }

    fn blank_label(&mut self) -> ParseResult<Value> {
        self.bump();
        if self.bump() != Some(':') {
            return self.error("expected '_:' blank node label");
        }
        let label = self.read_name();
        if label.is_empty() {
            return self.error("empty blank node label");
        }
        Ok(Value::blank(format!("{}l_{label}", self.blank_prefix)))
    }

    fn fresh_blank(&mut self) -> Value {
        self.anonymous += 1;
        Value::blank(format!("{}g{}", self.blank_prefix, self.anonymous))
    }

    fn emit(&mut self, subject: Value, predicate: Value, object: Value) {
        if self.store.insert(Triple::new(subject, predicate, object)) {
            self.inserted += 1;
        }
    }

    fn triples(&mut self) -> ParseResult<()> {
        self.skip_ws();
        if self.peek() == Some('[') {
            let subject = self.blank_property_list()?;
            self.skip_ws();
            if self.peek() != Some('.') {
                self.predicate_object_list(&subject)?;
            }
            return Ok(());
        }
        let subject = match self.peek() {
            Some('_') => self.blank_label()?,
            Some('(') => self.collection()?,
            _ => self.iri()?,
        };
        self.predicate_object_list(&subject)
    }

    fn predicate_object_list(&mut self, subject: &Value) -> ParseResult<()> {
        loop {
            self.skip_ws();
            let predicate = self.verb()?;
            self.object_list(subject, &predicate)?;
            self.skip_ws();
            if self.peek() != Some(';') {
                return Ok(());
            }
            while self.peek() == Some(';') {
                self.bump();
                self.skip_ws();
            }
            if matches!(self.peek(), Some('.') | Some(']') | None) {
                return Ok(());
            }
        }
    }

    fn verb(&mut self) -> ParseResult<Value> {
        if self.peek() == Some('a')
            && self
                .peek_at(1)
                .is_some_and(|c| c.is_whitespace() || c == '<' || c == '[')
        {
            self.bump();
            return Ok(Value::uri(RDF_TYPE));
        }
        self.iri()
    }

    fn object_list(&mut self, subject: &Value, predicate: &Value) -> ParseResult<()> {
        loop {
            let object = self.object()?;
            self.emit(subject.clone(), predicate.clone(), object);
            self.skip_ws();
            if self.peek() == Some(',') {
                self.bump();
            } else {
                return Ok(());
            }
        }
    }

    fn object(&mut self) -> ParseResult<Value> {
        self.skip_ws();
        match self.peek() {
            Some('<') => self.iriref().map(Value::Uri),
            Some('_') if self.peek_at(1) == Some(':') => self.blank_label(),
            Some('[') => self.blank_property_list(),
            Some('(') => self.collection(),
            Some('"') | Some('\'') => self.literal(),
            Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.' => self.number(),
            _ if self.at_boolean("true") || self.at_boolean("false") => {
                let word = self.read_name();
                Ok(Value::typed_literal(word, XSD_BOOLEAN))
            }
            _ => self.prefixed_name().map(Value::Uri),
        }
    }

    fn at_boolean(&self, word: &str) -> bool {
        word.chars()
            .enumerate()
            .all(|(offset, c)| self.peek_at(offset) == Some(c))
            && !self
                .peek_at(word.len())
                .is_some_and(|c| is_name_char(c) && c != '.')
    }

    fn blank_property_list(&mut self) -> ParseResult<Value> {
        self.bump();
        let node = self.fresh_blank();
        self.skip_ws();
        if self.peek() != Some(']') {
            self.predicate_object_list(&node)?;
        }
        self.expect(']')?;
        Ok(node)
    }

    fn collection(&mut self) -> ParseResult<Value> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(')') => {
                    self.bump();
                    break;
                }
                None => return self.error("unterminated collection"),
                Some(_) => items.push(self.object()?),
            }
        }
        let nodes: Vec<Value> = items.iter().map(|_| self.fresh_blank()).collect();
        for (index, item) in items.into_iter().enumerate() {
            let rest = nodes
                .get(index + 1)
                .cloned()
                .unwrap_or_else(|| Value::uri(RDF_NIL));
            self.emit(nodes[index].clone(), Value::uri(RDF_FIRST), item);
            self.emit(nodes[index].clone(), Value::uri(RDF_REST), rest);
        }
        Ok(nodes
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::uri(RDF_NIL)))
    }

    fn literal(&mut self) -> ParseResult<Value> {
        let quote = self.bump().unwrap_or('"');
        let long = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if long {
            self.bump();
            self.bump();
        }
        let mut lexical = String::new();
        loop {
            let Some(c) = self.bump() else {
                return self.error("unterminated string literal");
            };
            match c {
                '\\' => lexical.push(self.escape()?),
                c if c == quote && !long => break,
                c if c == quote => {
                    // Up to two quotes may precede the closing triple.
                    let mut run = 1;
                    while self.peek() == Some(quote) {
                        self.bump();
                        run += 1;
                    }
                    if run >= 3 {
                        lexical.extend(std::iter::repeat(quote).take(run - 3));
                        break;
                    }
                    lexical.extend(std::iter::repeat(quote).take(run));
                }
                '\n' | '\r' if !long => return self.error("newline in short string literal"),
                c => lexical.push(c),
            }
        }

        if self.peek() == Some('@') {
            self.bump();
            let mut language = String::new();
            while let Some(c) = self.peek().filter(|&c| c.is_ascii_alphanumeric() || c == '-') {
                language.push(c);
                self.bump();
            }
            return Ok(crate::Literal::tagged(lexical, language).into());
        }
        if self.peek() == Some('^') && self.peek_at(1) == Some('^') {
            self.bump();
            self.bump();
            let datatype = match self.iri()? {
                Value::Uri(datatype) => datatype,
                _ => return self.error("datatype must be an IRI"),
            };
            return Ok(Value::typed_literal(lexical, datatype));
        }
        Ok(Value::literal(lexical))
    }

    fn escape(&mut self) -> ParseResult<char> {
        let escaped = match self.bump() {
            Some('t') => '\t',
            Some('b') => '\u{8}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('f') => '\u{c}',
            Some(c @ ('"' | '\'' | '\\')) => c,
            Some('u') => self.unicode_escape(4)?,
            Some('U') => self.unicode_escape(8)?,
            Some(c) => return self.error(format!("invalid escape '\\{c}'")),
            None => return self.error("unterminated escape"),
        };
        Ok(escaped)
    }

    fn unicode_escape(&mut self, digits: usize) -> ParseResult<char> {
        let mut code = 0u32;
        for _ in 0..digits {
            let Some(digit) = self.bump().and_then(|c| c.to_digit(16)) else {
                return self.error("invalid unicode escape");
            };
            code = code * 16 + digit;
        }
        match char::from_u32(code) {
            Some(c) => Ok(c),
            None => self.error(format!("invalid code point U+{code:X}")),
        }
    }

    fn number(&mut self) -> ParseResult<Value> {
        let mut lexical = String::new();
        if let Some(sign) = self.peek().filter(|&c| c == '+' || c == '-') {
            lexical.push(sign);
            self.bump();
        }
        let mut digits = self.digits(&mut lexical);
        let mut datatype = XSD_INTEGER;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            lexical.push('.');
            self.bump();
            digits += self.digits(&mut lexical);
            datatype = XSD_DECIMAL;
        }
        if digits == 0 {
            return self.error("expected a number");
        }
        if let Some(marker) = self.peek().filter(|&c| c == 'e' || c == 'E') {
            lexical.push(marker);
            self.bump();
            if let Some(sign) = self.peek().filter(|&c| c == '+' || c == '-') {
                lexical.push(sign);
                self.bump();
            }
            if self.digits(&mut lexical) == 0 {
                return self.error("expected exponent digits");
            }
            datatype = XSD_DOUBLE;
        }
        Ok(Value::typed_literal(lexical, datatype))
    }

    fn digits(&mut self, out: &mut String) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            out.push(c);
            self.bump();
            count += 1;
        }
        count
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':' | '%') || (!c.is_ascii() && !c.is_whitespace())
}
