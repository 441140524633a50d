//! Fetching data documents for dynamic templates
//!
//! The component service asks a [`DataFetcher`] for the data document of a
//! dynamic template. [`HttpFetcher`] performs the call described by a
//! [`DynamicSetting`] with reqwest: a single request, no retries.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::types::DynamicSetting;

/// Source of data documents
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Fetch the data document described by `setting`
    ///
    /// Any failure (transport, non-success status, non-JSON body) is an error;
    /// deciding what to do about it is the caller's business.
    async fn fetch(&self, setting: &DynamicSetting) -> Result<JsonValue>;
}

/// Configuration for [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for the whole request
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request, below the setting's own headers
    pub default_headers: HashMap<String, String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("dynamic-template-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            default_headers: HashMap::new(),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }
}

/// [`DataFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(FetchConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Headers for a request: JSON content type, then defaults, then the
    /// setting's own headers, later entries replacing earlier ones
    pub fn request_headers(&self, setting: &DynamicSetting) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let defaults = self
            .config
            .default_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()));
        for (name, value) in defaults.chain(setting.headers()) {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::http_owned(format!("Invalid header name '{}': {}", name, e)))?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                Error::http_owned(format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl DataFetcher for HttpFetcher {
    async fn fetch(&self, setting: &DynamicSetting) -> Result<JsonValue> {
        let mut request = self
            .client
            .request(setting.http_method.into(), &setting.endpoint)
            .headers(self.request_headers(setting)?);

        if setting.http_method.sends_body() {
            let body = setting
                .request_json
                .clone()
                .unwrap_or_else(|| JsonValue::Object(Default::default()));
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_owned(format!(
                "{} {} responded with status {}",
                setting.http_method, setting.endpoint, status
            )));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
