//! Error handling for dynamic-template
//!
//! This module provides the error type shared by the merge engine, the
//! template store, the data fetcher and the component service.
//!
//! # Error Types
//!
//! - [`Error::NotFound`] - Template or dynamic setting lookup failures
//! - [`Error::MergeError`] - Failures of the pure merge core
//! - [`Error::HttpError`] - External data fetch failures (transport or status)
//! - [`Error::StoreError`] - Template persistence failures
//! - [`Error::JsonError`] - JSON parsing and serialization errors
//!
//! # Usage
//!
//! Only [`Error::NotFound`] ever reaches the caller of
//! [`ComponentService::get_component`]; every other failure on the dynamic
//! path is logged and downgraded to serving the static template.
//!
//! ```rust,ignore
//! use dynamic_template::{ComponentService, Error};
//!
//! match service.get_component("welcome-card").await {
//!     Ok(response) => println!("{}", response.data),
//!     Err(Error::NotFound(msg)) => println!("Not found: {}", msg),
//!     Err(err) => println!("Other error: {}", err),
//! }
//! ```
//!
//! [`ComponentService::get_component`]: crate::ComponentService::get_component

use std::borrow::Cow;
use thiserror::Error;

/// Error type for all dynamic-template operations
#[derive(Error, Debug)]
pub enum Error {
    /// A template or its dynamic setting does not exist
    #[error("Not found: {0}")]
    NotFound(Cow<'static, str>),

    /// The merge core could not process the template document
    ///
    /// Raised when a conventional variables location exists but does not
    /// hold a list.
    #[error("Merge error: {0}")]
    MergeError(Cow<'static, str>),

    /// The external data source could not be fetched
    ///
    /// Covers transport failures and non-success status codes.
    #[error("HTTP error: {0}")]
    HttpError(Cow<'static, str>),

    /// Template persistence failed
    #[error("Store error: {0}")]
    StoreError(Cow<'static, str>),

    /// JSON parsing and serialization errors
    ///
    /// Automatically converted from `serde_json::Error`.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// Create a not-found error with a static string
    pub fn not_found_static(msg: &'static str) -> Self {
        Error::NotFound(Cow::Borrowed(msg))
    }

    /// Create a not-found error with an owned string
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use dynamic_template::Error;
    ///
    /// let error = Error::not_found_owned(format!("Template with id \"{}\" not found", id));
    /// ```
    pub fn not_found_owned(msg: String) -> Self {
        Error::NotFound(Cow::Owned(msg))
    }

    /// Create a merge error with a static string
    pub fn merge_static(msg: &'static str) -> Self {
        Error::MergeError(Cow::Borrowed(msg))
    }

    /// Create a merge error with an owned string
    pub fn merge_owned(msg: String) -> Self {
        Error::MergeError(Cow::Owned(msg))
    }

    /// Create an HTTP error with a static string
    pub fn http_static(msg: &'static str) -> Self {
        Error::HttpError(Cow::Borrowed(msg))
    }

    /// Create an HTTP error with an owned string
    pub fn http_owned(msg: String) -> Self {
        Error::HttpError(Cow::Owned(msg))
    }

    /// Create a store error with a static string
    pub fn store_static(msg: &'static str) -> Self {
        Error::StoreError(Cow::Borrowed(msg))
    }

    /// Create a store error with an owned string
    pub fn store_owned(msg: String) -> Self {
        Error::StoreError(Cow::Owned(msg))
    }

    /// Whether this error should be surfaced to a client as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::http_owned(err.to_string())
    }
}

/// Result type alias for dynamic-template operations
pub type Result<T> = std::result::Result<T, Error>;
