//! Typed template variables and where templates keep them
//!
//! A template document declares its dynamic slots as a list of variable
//! records:
//!
//! ```json
//! {"name": "news", "type": "array", "value": [{"title": "{{title}}"}], "arrayKeyName": "articles"}
//! ```
//!
//! The list lives at one of three conventional locations, see
//! [`VariableLocation`]. The declared [`VariableType`] is independent of the
//! structural JSON type of `value`; the merger dispatches on the former and
//! checks the latter separately.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};

/// Declared type of a template variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Dict,
    Object,
}

impl VariableType {
    /// The name used in template documents
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::Array => "array",
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Integer => "integer",
            VariableType::Boolean => "boolean",
            VariableType::Dict => "dict",
            VariableType::Object => "object",
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            VariableType::String
                | VariableType::Number
                | VariableType::Integer
                | VariableType::Boolean
        )
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "array" => Ok(VariableType::Array),
            "string" => Ok(VariableType::String),
            "number" => Ok(VariableType::Number),
            "integer" => Ok(VariableType::Integer),
            "boolean" => Ok(VariableType::Boolean),
            "dict" => Ok(VariableType::Dict),
            "object" => Ok(VariableType::Object),
            other => Err(Error::merge_owned(format!("Unknown variable type: {}", other))),
        }
    }
}

/// A typed slot within a template whose value may contain placeholders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    #[serde(default)]
    pub value: JsonValue,
    /// Key into the data document for array variables, overriding `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_key_name: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableType, value: JsonValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
            array_key_name: None,
        }
    }

    pub fn with_array_key_name(mut self, key: impl Into<String>) -> Self {
        self.array_key_name = Some(key.into());
        self
    }

    /// Key used to find this variable's source array in the data document
    pub fn lookup_key(&self) -> &str {
        self.array_key_name.as_deref().unwrap_or(&self.name)
    }

    /// Parse a raw variable record
    ///
    /// Returns `None` for anything that is not an object with a known `type`;
    /// such records are carried through a merge untouched. Other fields are
    /// read leniently: a `name` or `arrayKeyName` that is missing or not a
    /// string falls back to its default.
    pub fn from_record(record: &JsonValue) -> Option<Self> {
        let fields = record.as_object()?;
        let kind = fields.get("type")?.as_str()?.parse().ok()?;

        Some(Self {
            name: fields
                .get("name")
                .and_then(JsonValue::as_str)
                .unwrap_or_default()
                .to_string(),
            kind,
            value: fields.get("value").cloned().unwrap_or_default(),
            array_key_name: fields
                .get("arrayKeyName")
                .and_then(JsonValue::as_str)
                .map(str::to_string),
        })
    }
}

/// Conventional places a template document keeps its variable list
///
/// Checked in declaration order; the first populated location wins and at
/// most one location is processed per merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableLocation {
    /// `card.variables`
    Card,
    /// top-level `variables`
    Root,
    /// `template.variables`
    Template,
}

impl VariableLocation {
    /// All locations in priority order
    pub const ALL: [VariableLocation; 3] = [
        VariableLocation::Card,
        VariableLocation::Root,
        VariableLocation::Template,
    ];

    /// JSON pointer to the variable list
    pub fn pointer(&self) -> &'static str {
        match self {
            VariableLocation::Card => "/card/variables",
            VariableLocation::Root => "/variables",
            VariableLocation::Template => "/template/variables",
        }
    }

    /// Find the first populated location in a document
    ///
    /// A location counts as populated unless it is absent, `null`, `false`,
    /// zero or the empty string. An empty list still counts.
    pub fn detect(document: &JsonValue) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|location| document.pointer(location.pointer()).is_some_and(is_populated))
    }

    /// Rename every array-typed variable at this location to `alias`
    ///
    /// Returns the number of variables renamed.
    pub fn rename_array_variables(&self, document: &mut JsonValue, alias: &str) -> usize {
        let Some(records) = document
            .pointer_mut(self.pointer())
            .and_then(JsonValue::as_array_mut)
        else {
            return 0;
        };

        let mut renamed = 0;
        for record in records.iter_mut().filter_map(JsonValue::as_object_mut) {
            if record.get("type").and_then(JsonValue::as_str) == Some("array") {
                record.insert("name".to_string(), JsonValue::String(alias.to_string()));
                renamed += 1;
            }
        }
        renamed
    }
}

impl fmt::Display for VariableLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableLocation::Card => f.write_str("card.variables"),
            VariableLocation::Root => f.write_str("variables"),
            VariableLocation::Template => f.write_str("template.variables"),
        }
    }
}

fn is_populated(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}
