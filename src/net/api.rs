//! Data-access seam and its HTTP implementation.
//!
//! `HttpClient` is a thin reqwest wrapper. URL building and response parsing
//! are pure functions so they can be tested without a server.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::types::{Collection, Relation};
use crate::config::ApiConfig;
use crate::form::value::RecordId;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body read.
    #[error("request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// A successful response that did not confirm the write, e.g. a create
    /// answering with no record or a delete of a missing id.
    #[error("service rejected the {0}")]
    Rejected(&'static str),

    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_STATUS",
            Self::Parse(_) => "E_API_PARSE",
            Self::Rejected(_) => "E_API_REJECTED",
            Self::ClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::InvalidBaseUrl(_) => "E_INVALID_BASE_URL",
        }
    }

    /// Whether retrying the same call could succeed. Nothing retries
    /// automatically; the caller decides.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Remote record store. Bodies and records are raw JSON; typed views live in
/// `net::types`.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Every record of `collection`, filtered by query `params`.
    async fn list(&self, collection: Collection, params: &[(&str, &str)]) -> Result<Vec<Value>, ApiError>;

    /// One record. The service answers single-record reads with an array;
    /// its first element is the record.
    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Value>, ApiError>;

    async fn create(&self, collection: Collection, body: &Value) -> Result<Option<Value>, ApiError>;

    async fn update(&self, collection: Collection, id: RecordId, body: &Value) -> Result<Option<Value>, ApiError>;

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<bool, ApiError>;

    async fn connect_relation(&self, relation: Relation, owner: RecordId, related: RecordId) -> Result<bool, ApiError>;

    async fn disconnect_relation(&self, relation: Relation, owner: RecordId, related: RecordId)
    -> Result<bool, ApiError>;
}

/// List `collection` and deserialize every record.
///
/// # Errors
///
/// Propagates the list error, or `Parse` for a record of the wrong shape.
pub async fn fetch_all<T: DeserializeOwned>(
    api: &dyn DataAccess,
    collection: Collection,
    params: &[(&str, &str)],
) -> Result<Vec<T>, ApiError> {
    api.list(collection, params)
        .await?
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(|e| ApiError::Parse(e.to_string())))
        .collect()
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `InvalidBaseUrl` for a base URL without an http(s) scheme, or
    /// `ClientBuild` when reqwest cannot build the client.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(config.base_url.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        debug!(method = method.as_str(), url = url.as_str(), "api request");
        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        parse_body(status, &text)
    }
}

#[async_trait]
impl DataAccess for HttpClient {
    async fn list(&self, collection: Collection, params: &[(&str, &str)]) -> Result<Vec<Value>, ApiError> {
        let body = self
            .send(Method::GET, collection_url(&self.base_url, collection), params, None)
            .await?;
        parse_list(body)
    }

    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Value>, ApiError> {
        let body = self
            .send(Method::GET, record_url(&self.base_url, collection, id), &[], None)
            .await?;
        Ok(first_record(body))
    }

    async fn create(&self, collection: Collection, body: &Value) -> Result<Option<Value>, ApiError> {
        self.send(Method::POST, collection_url(&self.base_url, collection), &[], Some(body))
            .await
    }

    async fn update(&self, collection: Collection, id: RecordId, body: &Value) -> Result<Option<Value>, ApiError> {
        self.send(Method::PUT, record_url(&self.base_url, collection, id), &[], Some(body))
            .await
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<bool, ApiError> {
        self.send(Method::DELETE, record_url(&self.base_url, collection, id), &[], None)
            .await?;
        Ok(true)
    }

    async fn connect_relation(&self, relation: Relation, owner: RecordId, related: RecordId) -> Result<bool, ApiError> {
        self.send(Method::PUT, relation_url(&self.base_url, relation, owner, related), &[], None)
            .await?;
        Ok(true)
    }

    async fn disconnect_relation(
        &self,
        relation: Relation,
        owner: RecordId,
        related: RecordId,
    ) -> Result<bool, ApiError> {
        self.send(Method::DELETE, relation_url(&self.base_url, relation, owner, related), &[], None)
            .await?;
        Ok(true)
    }
}

// =============================================================================
// ROUTES & PARSING
// =============================================================================

#[must_use]
pub fn collection_url(base_url: &str, collection: Collection) -> String {
    format!("{base_url}/{}", collection.path())
}

#[must_use]
pub fn record_url(base_url: &str, collection: Collection, id: RecordId) -> String {
    format!("{base_url}/{}/{id}", collection.path())
}

#[must_use]
pub fn relation_url(base_url: &str, relation: Relation, owner: RecordId, related: RecordId) -> String {
    format!("{base_url}/{}/{owner}/{}/{related}", relation.owner().path(), relation.segment())
}

/// Map a raw response to its JSON body. An empty or `null` body is `None`.
///
/// # Errors
///
/// Returns `Status` for non-2xx responses and `Parse` for malformed JSON.
pub fn parse_body(status: u16, text: &str) -> Result<Option<Value>, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::Status { status, body: text.to_owned() });
    }
    if text.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

fn parse_list(body: Option<Value>) -> Result<Vec<Value>, ApiError> {
    match body {
        None => Ok(Vec::new()),
        Some(Value::Array(records)) => Ok(records),
        Some(other) => Err(ApiError::Parse(format!("expected an array, got {other}"))),
    }
}

fn first_record(body: Option<Value>) -> Option<Value> {
    match body? {
        Value::Array(records) => records.into_iter().next(),
        record => Some(record),
    }
}
