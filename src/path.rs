//! Path resolution over JSON data documents
//!
//! Dotted paths such as `data.items.0.title` are walked key by key against a
//! [`serde_json::Value`]. Resolution is total: a missing or null intermediate
//! yields `None`, never an error.
//!
//! Array-typed variables additionally get [`find_array_by_fallback`], which
//! tolerates the usual top-level wrappers third-party APIs put around their
//! lists (`data`, `items`, `results`, ...).

use serde_json::Value as JsonValue;

/// Resolve a dot-separated path against a JSON value
///
/// Object segments are looked up by key, array segments by numeric index.
/// Returns `None` when the path is empty, the root is null, or any segment is
/// missing. A present `null` leaf is returned as `Some(&Value::Null)`.
///
/// # Examples
///
/// ```
/// use dynamic_template::path::resolve_path;
/// use serde_json::json;
///
/// let data = json!({"user": {"tags": ["a", "b"]}});
/// assert_eq!(resolve_path(&data, "user.tags.1"), Some(&json!("b")));
/// assert_eq!(resolve_path(&data, "user.missing.deeper"), None);
/// ```
pub fn resolve_path<'a>(root: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    if path.is_empty() || root.is_null() {
        return None;
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            JsonValue::Object(map) => map.get(segment)?,
            JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Candidate paths tried, in order, when an array variable's key is not found
///
/// The order is part of the observable behavior: ambiguous responses always
/// resolve to the first candidate that holds an array.
pub fn fallback_candidates(key: &str) -> [String; 7] {
    [
        key.to_string(),
        format!("data.{}", key),
        format!("response.{}", key),
        key.replace('_', ""),
        "data".to_string(),
        "items".to_string(),
        "results".to_string(),
    ]
}

/// Search common response wrappers for an array belonging to `key`
///
/// Returns the first candidate from [`fallback_candidates`] that resolves to
/// an array, or `None` when none does.
pub fn find_array_by_fallback<'a>(data: &'a JsonValue, key: &str) -> Option<&'a Vec<JsonValue>> {
    fallback_candidates(key)
        .iter()
        .find_map(|candidate| resolve_path(data, candidate)?.as_array())
}

/// Locate the source array for an array variable
///
/// Tries a direct key lookup, then nested path resolution, then
/// [`find_array_by_fallback`].
pub fn find_source_array<'a>(data: &'a JsonValue, key: &str) -> Option<&'a Vec<JsonValue>> {
    if let Some(items) = data.get(key).and_then(JsonValue::as_array) {
        return Some(items);
    }
    if let Some(items) = resolve_path(data, key).and_then(JsonValue::as_array) {
        return Some(items);
    }
    find_array_by_fallback(data, key)
}

/// Remove a leading `prefix.` segment from a path
///
/// Placeholders inside an array item may address fields either relative to
/// the item (`title`) or through the array's own key (`list.title`).
pub fn strip_array_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path)
}
