//! Template merge engine
//!
//! This module implements the core of dynamic templates: given a template
//! document and an already fetched data document, it resolves the placeholders
//! in every variable's value and returns a new, fully materialized document.
//!
//! # Dispatch
//!
//! | declared type | behavior |
//! |---|---|
//! | `array` | expand the item stamp once per source item |
//! | `string`, `number`, `integer`, `boolean` | resolve a placeholder against the data document |
//! | `dict`, `object` | rewrite every placeholder in the value tree |
//!
//! Records with an unknown or missing type pass through unchanged.
//!
//! Everything here is pure: inputs are borrowed, outputs are freshly built,
//! and nothing is logged. Callers that want diagnostics inspect the returned
//! [`MergedDocument`].

use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::path::{find_source_array, resolve_path, strip_array_prefix};
use crate::placeholder::{extract_path, is_placeholder};
use crate::variable::{Variable, VariableLocation, VariableType};

/// Field that array items may carry as a newline-separated string
pub const DESCRIPTIONS_FIELD: &str = "descriptions";

/// Result of merging a template document with a data document
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDocument {
    /// The merged document
    pub document: JsonValue,
    /// Where the variable list was found, if anywhere
    pub location: Option<VariableLocation>,
    /// Number of variable records at that location
    pub variables: usize,
    /// Number of variables whose value changed
    pub resolved: usize,
}

/// Merge a template document against a data document
///
/// The variable list is taken from the first populated
/// [`VariableLocation`]; every other part of the document is copied as is.
/// A document without variables merges to an identical copy.
///
/// # Errors
///
/// Returns [`Error::MergeError`] when the detected location does not hold a
/// list.
///
/// # Examples
///
/// ```
/// use dynamic_template::merge_document;
/// use serde_json::json;
///
/// let template = json!({"variables": [
///     {"name": "list", "type": "array", "value": [{"title": "{{list.name}}"}]}
/// ]});
/// let data = json!({"list": [{"name": "A"}, {"name": "B"}]});
///
/// let merged = merge_document(&template, &data).unwrap();
/// assert_eq!(
///     merged.document["variables"][0]["value"],
///     json!([{"title": "A"}, {"title": "B"}])
/// );
/// ```
pub fn merge_document(template: &JsonValue, data: &JsonValue) -> Result<MergedDocument> {
    let mut document = template.clone();

    let Some(location) = VariableLocation::detect(&document) else {
        return Ok(MergedDocument {
            document,
            location: None,
            variables: 0,
            resolved: 0,
        });
    };

    let records = document
        .pointer_mut(location.pointer())
        .and_then(JsonValue::as_array_mut)
        .ok_or_else(|| Error::merge_owned(format!("{} is not a list", location)))?;

    let variables = records.len();
    let mut resolved = 0;
    for record in records.iter_mut() {
        if let Some(merged) = merge_record(record, data) {
            *record = merged;
            resolved += 1;
        }
    }

    Ok(MergedDocument {
        document,
        location: Some(location),
        variables,
        resolved,
    })
}

/// Merge one raw variable record
///
/// Returns the rewritten record when its value changed, keeping every other
/// field of the record as it was. Returns `None` when the record is left
/// untouched, including records that are not valid variables.
pub fn merge_record(record: &JsonValue, data: &JsonValue) -> Option<JsonValue> {
    let variable = Variable::from_record(record)?;
    let merged = merge_variable(&variable, data);
    if merged.value == variable.value {
        return None;
    }

    let mut record = record.clone();
    record
        .as_object_mut()?
        .insert("value".to_string(), merged.value);
    Some(record)
}

/// Merge a single variable according to its declared type
pub fn merge_variable(variable: &Variable, data: &JsonValue) -> Variable {
    match variable.kind {
        VariableType::Array => merge_array_variable(variable, data),
        VariableType::Dict | VariableType::Object => merge_object_variable(variable, data),
        kind if kind.is_primitive() => merge_primitive_variable(variable, data),
        _ => variable.clone(),
    }
}

/// Expand an array variable once per item of its source array
///
/// Only the first element of the declared value is used as the item stamp.
/// Placeholders in the stamp resolve against each source item, with a leading
/// `<lookup key>.` segment stripped. The variable is returned unchanged when
/// its value is not a non-empty array or no source array can be found.
pub fn merge_array_variable(variable: &Variable, data: &JsonValue) -> Variable {
    let Some(stamp) = variable.value.as_array().and_then(|items| items.first()) else {
        return variable.clone();
    };

    let lookup_key = variable.lookup_key();
    let Some(source) = find_source_array(data, lookup_key) else {
        return variable.clone();
    };

    let items = source
        .iter()
        .map(|item| {
            let mut mapped = rewrite(stamp, item, Some(lookup_key));
            split_descriptions(&mut mapped);
            mapped
        })
        .collect();

    Variable {
        value: JsonValue::Array(items),
        ..variable.clone()
    }
}

/// Resolve a primitive variable whose value is a placeholder
///
/// A placeholder that does not resolve stays as the literal placeholder
/// string.
pub fn merge_primitive_variable(variable: &Variable, data: &JsonValue) -> Variable {
    let JsonValue::String(text) = &variable.value else {
        return variable.clone();
    };
    if !is_placeholder(text) {
        return variable.clone();
    }

    match resolve_path(data, &extract_path(text)) {
        Some(resolved) => Variable {
            value: resolved.clone(),
            ..variable.clone()
        },
        None => variable.clone(),
    }
}

/// Rewrite every placeholder inside an object variable's value
///
/// Any container value is rewritten, so a list held by a `dict` variable has
/// its elements resolved too. Scalars and `null` are returned unchanged.
pub fn merge_object_variable(variable: &Variable, data: &JsonValue) -> Variable {
    if !(variable.value.is_object() || variable.value.is_array()) {
        return variable.clone();
    }

    Variable {
        value: rewrite(&variable.value, data, None),
        ..variable.clone()
    }
}

/// Recursively rewrite placeholders in a JSON tree
///
/// Placeholder strings are replaced by the value their path resolves to in
/// `data`, or left as is when unresolved. When `prefix` is given, a leading
/// `prefix.` segment is removed from each path first. Arrays and objects are
/// rebuilt with the same length, keys and order; the source is never mutated.
pub fn rewrite(node: &JsonValue, data: &JsonValue, prefix: Option<&str>) -> JsonValue {
    match node {
        JsonValue::String(text) if is_placeholder(text) => {
            let path = extract_path(text);
            let path = match prefix {
                Some(prefix) if !prefix.is_empty() => strip_array_prefix(&path, prefix),
                _ => path.as_str(),
            };
            resolve_path(data, path)
                .cloned()
                .unwrap_or_else(|| node.clone())
        }
        JsonValue::Array(items) => JsonValue::Array(
            items.iter().map(|item| rewrite(item, data, prefix)).collect(),
        ),
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), rewrite(value, data, prefix)))
                .collect::<Map<String, JsonValue>>(),
        ),
        _ => node.clone(),
    }
}

/// Turn a newline-separated `descriptions` string into `[{"text": line}]`
///
/// Blank lines are dropped and each line is trimmed. Items without a
/// non-empty string `descriptions` field are left alone.
pub fn split_descriptions(item: &mut JsonValue) {
    let Some(fields) = item.as_object_mut() else {
        return;
    };
    let lines: Vec<JsonValue> = match fields.get(DESCRIPTIONS_FIELD) {
        Some(JsonValue::String(text)) if !text.is_empty() => text
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| serde_json::json!({ "text": line }))
            .collect(),
        _ => return,
    };
    fields.insert(DESCRIPTIONS_FIELD.to_string(), JsonValue::Array(lines));
}
