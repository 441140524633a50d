//! Dynamic JSON templates for server-driven UI
//!
//! This crate serves UI component definitions ("templates") that are either
//! fully static JSON or dynamic: a static skeleton whose declared variables are
//! populated at request time from an external JSON data source.
//!
//! The heart of the crate is the merge engine in [`merger`], which takes a
//! template document and a fetched data document and resolves every
//! `{{path}}` placeholder inside the template's variables, expanding array
//! variables once per source item.
//!
//! # Examples
//!
//! ```
//! use dynamic_template::merge_document;
//! use serde_json::json;
//!
//! let template = json!({
//!     "card": {
//!         "log_id": "news",
//!         "variables": [
//!             {"name": "count", "type": "number", "value": "{{response.total}}"},
//!             {"name": "news", "type": "array", "value": [{"title": "{{title}}"}]}
//!         ]
//!     }
//! });
//! let data = json!({"total": 2, "news": [{"title": "A"}, {"title": "B"}]});
//!
//! let merged = merge_document(&template, &data)?;
//! assert_eq!(merged.document["card"]["variables"][0]["value"], json!(2));
//! assert_eq!(
//!     merged.document["card"]["variables"][1]["value"],
//!     json!([{"title": "A"}, {"title": "B"}])
//! );
//! # Ok::<(), dynamic_template::Error>(())
//! ```
//!
//! Serving components end to end goes through [`ComponentService`], which
//! combines a [`TemplateStore`] with a [`DataFetcher`] and falls back to the
//! static template whenever the dynamic path fails.

pub mod error;
pub mod placeholder;
pub mod path;
pub mod variable;
pub mod merger;
pub mod types;
pub mod store;
pub mod fetcher;
pub mod service;
pub mod test_utils;

// Re-export commonly used types
pub use error::{Error, Result};
pub use fetcher::{DataFetcher, FetchConfig, HttpFetcher};
pub use merger::{merge_document, merge_variable, rewrite, MergedDocument};
pub use path::{find_array_by_fallback, resolve_path};
pub use placeholder::extract_path;
pub use service::{ComponentService, RenderCachePolicy, ServiceConfig};
pub use store::{InMemoryTemplateStore, TemplateStore};
pub use types::{
    ComponentResponse, DynamicSetting, HttpMethod, NewTemplate, TemplateRecord, TemplateType,
    TemplateUpdate,
};
pub use variable::{Variable, VariableLocation, VariableType};
