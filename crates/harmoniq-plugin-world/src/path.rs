use std::env;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use harmoniq_rdf::{uri, Value};
use walkdir::WalkDir;

/// Ordered list of directories that may contain LV2 bundles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    directories: Vec<PathBuf>,
}

impl SearchPath {
    /// Split a colon-separated list verbatim.
    pub fn explicit(list: &str) -> Self {
        Self {
            directories: list
                .split(':')
                .filter(|entry| !entry.is_empty())
                .map(PathBuf::from)
                .collect(),
        }
    }

    /// Split a colon-separated list and run every entry through
    /// [`expand_words`]. Entries expanding to nothing are dropped.
    pub fn expanded(list: &str) -> Self {
        Self {
            directories: list
                .split(':')
                .flat_map(expand_words)
                .map(PathBuf::from)
                .collect(),
        }
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }

    /// Bundle URIs of every directory in the path, in search-path order.
    pub fn discover_bundles(&self) -> Vec<Value> {
        self.directories
            .iter()
            .flat_map(|dir| scan_directory(dir))
            .collect()
    }
}

/// Shell-style word expansion: `~` at the start of a word, `$NAME` and
/// `${NAME}` variables, quoting, backslash escapes and field splitting of
/// unquoted whitespace. Unset variables expand to nothing.
pub fn expand_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some('\''), c) => current.push(c),
            (Some(_), '$') => current.push_str(&expand_variable(&mut chars)),
            (Some(_), '\\') => current.push(chars.next().unwrap_or('\\')),
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                    in_word = true;
                }
            }
            (None, '~') if !in_word && matches!(chars.peek(), None | Some('/')) => {
                match dirs::home_dir() {
                    Some(home) => current.push_str(&home.to_string_lossy()),
                    None => current.push('~'),
                }
                in_word = true;
            }
            (None, '$') => {
                for c in expand_variable(&mut chars).chars() {
                    if c.is_whitespace() {
                        if in_word {
                            words.push(std::mem::take(&mut current));
                            in_word = false;
                        }
                    } else {
                        current.push(c);
                        in_word = true;
                    }
                }
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

fn expand_variable(chars: &mut Peekable<Chars<'_>>) -> String {
    match chars.peek() {
        Some('{') => {
            chars.next();
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    return env::var(&name).unwrap_or_default();
                }
                name.push(c);
            }
            format!("${{{name}")
        }
        Some(&c) if c.is_ascii_alphabetic() || c == '_' => {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if !(c.is_ascii_alphanumeric() || c == '_') {
                    break;
                }
                name.push(c);
                chars.next();
            }
            env::var(&name).unwrap_or_default()
        }
        _ => "$".to_owned(),
    }
}

/// Every subdirectory of `dir` as a bundle URI (with trailing slash), in
/// file-name order. Unreadable directories and plain files are skipped.
pub fn scan_directory(dir: &Path) -> Vec<Value> {
    let root = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(dir),
            Err(err) => {
                tracing::debug!(?err, dir = %dir.display(), "cannot resolve relative search path entry");
                return Vec::new();
            }
        }
    };

    let mut bundles = Vec::new();
    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(dir = %root.display(), %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        match uri::directory_uri(entry.path()) {
            Some(bundle) => bundles.push(Value::uri(bundle)),
            None => tracing::debug!(path = %entry.path().display(), "bundle path has no file URI"),
        }
    }
    bundles
}
