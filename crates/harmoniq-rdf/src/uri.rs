//! Conversions between `file:` URIs and filesystem paths.

use std::path::{Path, PathBuf};

use url::Url;

/// Map a `file:` URI to a local path. Any other scheme yields `None`.
pub fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let url = Url::parse(uri).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

/// Directory URI with a trailing slash, so relative references resolve
/// inside the directory. `path` must be absolute.
pub fn directory_uri(path: &Path) -> Option<String> {
    Url::from_directory_path(path).ok().map(String::from)
}

pub fn file_uri(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}

/// Resolve `reference` against `base`.
pub fn resolve(base: &str, reference: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(base)?.join(reference)?.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn directory_uri_keeps_trailing_slash() {
        let uri = directory_uri(Path::new("/usr/lib/lv2/amp.lv2")).unwrap();
        assert_eq!(uri, "file:///usr/lib/lv2/amp.lv2/");
        assert_eq!(
            resolve(&uri, "manifest.ttl").unwrap(),
            "file:///usr/lib/lv2/amp.lv2/manifest.ttl"
        );
    }

    #[test]
    fn file_uris_round_trip_through_paths() {
        let path = file_uri_to_path("file:///usr/lib/lv2/amp%20x.lv2/amp.so").unwrap();
        assert_eq!(path, PathBuf::from("/usr/lib/lv2/amp x.lv2/amp.so"));
        assert_eq!(file_uri_to_path("http://lv2plug.in/ns/lv2core#"), None);
    }
}
