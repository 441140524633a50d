//! Template records and response types
//!
//! This module contains the records a template store persists and the
//! envelope the component service answers with.
//!
//! # Key Types
//!
//! - [`TemplateRecord`] - A stored template with its static JSON and optional dynamic setting
//! - [`DynamicSetting`] - How to fetch the data document for a dynamic template
//! - [`ComponentResponse`] - The `{ "success": ..., "data": ... }` envelope

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};

/// Whether a template is served as is or merged with external data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    #[default]
    Static,
    Dynamic,
}

/// HTTP method used to fetch a template's data document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether requests with this method carry the JSON request body
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            _ => Err(Error::http_owned(format!("Unsupported HTTP method: {}", s))),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Configuration for fetching a dynamic template's data document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSetting {
    pub endpoint: String,
    #[serde(default)]
    pub http_method: HttpMethod,
    /// JSON body sent with non-GET requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_json: Option<JsonValue>,
    /// Extra request headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_json: Option<Map<String, JsonValue>>,
}

impl DynamicSetting {
    pub fn new(endpoint: impl Into<String>, http_method: HttpMethod) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_method,
            request_json: None,
            header_json: None,
        }
    }

    pub fn with_request_json(mut self, body: JsonValue) -> Self {
        self.request_json = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header_json
            .get_or_insert_with(Map::new)
            .insert(name.into(), JsonValue::String(value.into()));
        self
    }

    /// Header pairs from `header_json`
    ///
    /// String values are used verbatim; other JSON values are rendered with
    /// their JSON text. `null` entries are skipped.
    pub fn headers(&self) -> Vec<(String, String)> {
        let Some(headers) = &self.header_json else {
            return Vec::new();
        };
        headers
            .iter()
            .filter_map(|(name, value)| match value {
                JsonValue::Null => None,
                JsonValue::String(s) => Some((name.clone(), s.clone())),
                other => Some((name.clone(), other.to_string())),
            })
            .collect()
    }
}

/// A stored template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    pub template_id: String,
    pub template_name: String,
    #[serde(default)]
    pub template_type: TemplateType,
    /// The reusable placeholder template
    pub static_template_json: JsonValue,
    /// Last dynamic render, when the service is configured to keep it
    #[serde(default)]
    pub dynamic_template_json: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_setting: Option<DynamicSetting>,
}

impl TemplateRecord {
    /// Create a static template record
    pub fn new(
        template_id: impl Into<String>,
        template_name: impl Into<String>,
        template_json: JsonValue,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            template_name: template_name.into(),
            template_type: TemplateType::Static,
            dynamic_template_json: Some(template_json.clone()),
            static_template_json: template_json,
            dynamic_setting: None,
        }
    }

    /// Attach a dynamic setting and mark the template dynamic
    pub fn with_dynamic_setting(mut self, setting: DynamicSetting) -> Self {
        self.template_type = TemplateType::Dynamic;
        self.dynamic_setting = Some(setting);
        self
    }
}

/// Payload for creating a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub template_name: String,
    pub template_json: JsonValue,
}

/// Partial update of a template; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub template_type: Option<TemplateType>,
    #[serde(default)]
    pub static_template_json: Option<JsonValue>,
    #[serde(default)]
    pub dynamic_template_json: Option<JsonValue>,
}

/// Response envelope for component retrieval
///
/// Dynamic fetch and merge failures still answer with `success: true` and
/// the static template as `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentResponse {
    pub success: bool,
    pub data: JsonValue,
}

impl ComponentResponse {
    pub fn success(data: JsonValue) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
