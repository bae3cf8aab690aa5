#![deny(missing_docs)]

//! # Reference Utilities
//!
//! Shared helpers for `$ref` strings and JSON Pointers.
//!
//! These never fetch external documents. Absolute or relative references are
//! treated as local only when their document part matches the current
//! document's `$self` URI.

use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::path::Path;
use url::Url;

/// Normalizes a `$ref` to a local JSON Pointer (e.g. `#/components/...`).
///
/// Returns `None` if the reference targets another document.
pub(crate) fn normalize_ref_to_local(ref_str: &str, self_uri: Option<&str>) -> Option<String> {
    if ref_str.starts_with('#') {
        return Some(ref_str.to_string());
    }

    let (document, fragment) = ref_str.split_once('#')?;
    let self_uri = self_uri?;
    if ref_doc_matches_self(document, self_uri) {
        return Some(format!("#{}", fragment));
    }
    None
}

/// Decodes a JSON Pointer segment (handles `~1`, `~0` and percent escapes).
pub(crate) fn decode_pointer_segment(segment: &str) -> String {
    let decoded = segment.replace("~1", "/").replace("~0", "~");
    percent_decode_str(&decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Encodes a map key as a JSON Pointer segment.
pub(crate) fn encode_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Appends a key to a local pointer: `#/paths` + `/users` → `#/paths/~1users`.
pub(crate) fn child_pointer(parent: &str, key: &str) -> String {
    format!("{}/{}", parent, encode_pointer_segment(key))
}

/// Walks a local pointer (`#/a/b/0`) from `root`.
pub(crate) fn lookup_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let path = pointer.strip_prefix('#').unwrap_or(pointer);
    if path.is_empty() {
        return Some(root);
    }
    let path = path.strip_prefix('/')?;

    let mut current = root;
    for raw in path.split('/') {
        let segment = decode_pointer_segment(raw);
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn ref_doc_matches_self(ref_doc: &str, self_uri: &str) -> bool {
    if ref_doc == self_uri {
        return true;
    }

    if let (Ok(ref_url), Ok(self_url)) = (Url::parse(ref_doc), Url::parse(self_uri)) {
        return ref_url.scheme() == self_url.scheme()
            && ref_url.host() == self_url.host()
            && ref_url.port() == self_url.port()
            && ref_url.path() == self_url.path();
    }

    // If `$self` is an absolute-path reference (e.g. "/api/openapi"), compare path.
    if self_uri.starts_with('/') {
        if let Ok(ref_url) = Url::parse(ref_doc) {
            return ref_url.path() == self_uri;
        }
    }

    // Fallback: compare raw relative paths.
    if !self_uri.contains("://") && !ref_doc.contains("://") {
        return Path::new(ref_doc) == Path::new(self_uri);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_ref_local_passthrough() {
        let normalized = normalize_ref_to_local("#/components/schemas/User", None).unwrap();
        assert_eq!(normalized, "#/components/schemas/User");
    }

    #[test]
    fn test_normalize_ref_self_absolute_match() {
        let self_uri = Some("https://example.com/openapi.yaml");
        let ref_str = "https://example.com/openapi.yaml#/components/schemas/User";
        let normalized = normalize_ref_to_local(ref_str, self_uri).unwrap();
        assert_eq!(normalized, "#/components/schemas/User");
    }

    #[test]
    fn test_external_ref_is_not_local() {
        assert!(normalize_ref_to_local("common.yaml#/components/schemas/Error", None).is_none());
        assert!(normalize_ref_to_local(
            "https://other.example/spec.yaml#/x",
            Some("https://example.com/openapi.yaml")
        )
        .is_none());
    }

    #[test]
    fn test_decode_pointer_segment_percent_encoding() {
        assert_eq!(
            decode_pointer_segment("User%20Profile~1details"),
            "User Profile/details"
        );
    }

    #[test]
    fn test_lookup_pointer_through_arrays_and_escapes() {
        let doc = json!({"paths": {"/users/{id}": {"get": {"tags": ["a", "b"]}}}});
        let ptr = child_pointer("#/paths", "/users/{id}");
        assert_eq!(ptr, "#/paths/~1users~1{id}");
        assert_eq!(
            lookup_pointer(&doc, &format!("{}/get/tags/1", ptr)),
            Some(&json!("b"))
        );
        assert!(lookup_pointer(&doc, "#/paths/missing").is_none());
        assert_eq!(lookup_pointer(&doc, "#"), Some(&doc));
    }
}
