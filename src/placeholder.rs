//! Placeholder detection and path extraction
//!
//! A placeholder is a string value such as `{{response.data.title}}` that
//! marks a value to be resolved against the fetched data document. A string
//! is either entirely a placeholder or entirely a literal; there is no partial
//! interpolation and no escaping.

use once_cell::sync::Lazy;
use regex::Regex;

static DELIMITER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{|\}\}").expect("Invalid delimiter regex"));

/// Segment prefix that template authors may use to address the response root
pub const RESPONSE_PREFIX: &str = "response.";

/// Check whether a string should be treated as a placeholder
///
/// Any string containing both an opening `{{` and a closing `}}` qualifies.
pub fn is_placeholder(s: &str) -> bool {
    s.contains("{{") && s.contains("}}")
}

/// Extract the dotted path from a placeholder string
///
/// Strips every `{{`/`}}` delimiter, trims surrounding whitespace and drops a
/// single leading `response.` segment. No resolution happens here.
///
/// # Examples
///
/// ```
/// use dynamic_template::placeholder::extract_path;
///
/// assert_eq!(extract_path("{{ response.data.total }}"), "data.total");
/// assert_eq!(extract_path("{{title}}"), "title");
/// ```
pub fn extract_path(placeholder: &str) -> String {
    let cleaned = DELIMITER_REGEX.replace_all(placeholder, "");
    let trimmed = cleaned.trim();
    trimmed
        .strip_prefix(RESPONSE_PREFIX)
        .unwrap_or(trimmed)
        .to_string()
}
