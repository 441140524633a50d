//! Test utilities for dynamic template testing
//!
//! This module provides JSON comparison helpers and canned [`DataFetcher`]
//! implementations so the component service can be exercised without a
//! network.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::fetcher::DataFetcher;
use crate::types::DynamicSetting;
use crate::variable::VariableLocation;

/// Pretty-print JSON for assertion messages
pub fn pretty_json(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Assert that two JSON values are equal, printing both pretty on failure
///
/// # Examples
///
/// ```
/// use dynamic_template::assert_json_eq;
/// use serde_json::json;
///
/// assert_json_eq!(json!({"a": 1, "b": [true]}), json!({"b": [true], "a": 1}));
/// ```
#[macro_export]
macro_rules! assert_json_eq {
    ($left:expr, $right:expr) => {
        {
            let left: &serde_json::Value = &$left;
            let right: &serde_json::Value = &$right;

            if left != right {
                panic!(
                    "JSON assertion failed\n\nLeft:\n{}\n\nRight:\n{}",
                    $crate::test_utils::pretty_json(left),
                    $crate::test_utils::pretty_json(right)
                );
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)*) => {
        {
            let left: &serde_json::Value = &$left;
            let right: &serde_json::Value = &$right;

            if left != right {
                panic!(
                    "JSON assertion failed: {}\n\nLeft:\n{}\n\nRight:\n{}",
                    format!($($arg)*),
                    $crate::test_utils::pretty_json(left),
                    $crate::test_utils::pretty_json(right)
                );
            }
        }
    };
}

/// The variable list of a document at `location`, if it is a list
pub fn variables_at(document: &JsonValue, location: VariableLocation) -> Option<&Vec<JsonValue>> {
    document.pointer(location.pointer())?.as_array()
}

/// The merged value of the named variable at `location`
pub fn variable_value<'a>(
    document: &'a JsonValue,
    location: VariableLocation,
    name: &str,
) -> Option<&'a JsonValue> {
    variables_at(document, location)?
        .iter()
        .find(|record| record.get("name").and_then(JsonValue::as_str) == Some(name))?
        .get("value")
}

/// Fetcher that always answers with the same document
#[derive(Debug)]
pub struct StaticFetcher {
    data: JsonValue,
    calls: AtomicUsize,
}

impl StaticFetcher {
    pub fn new(data: JsonValue) -> Self {
        Self {
            data,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches performed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataFetcher for StaticFetcher {
    async fn fetch(&self, _setting: &DynamicSetting) -> Result<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.clone())
    }
}

/// Fetcher that always fails as if the endpoint answered with `status`
#[derive(Debug)]
pub struct FailingFetcher {
    pub status: u16,
}

impl Default for FailingFetcher {
    fn default() -> Self {
        Self { status: 503 }
    }
}

#[async_trait]
impl DataFetcher for FailingFetcher {
    async fn fetch(&self, setting: &DynamicSetting) -> Result<JsonValue> {
        Err(Error::http_owned(format!(
            "{} {} responded with status {}",
            setting.http_method, setting.endpoint, self.status
        )))
    }
}
