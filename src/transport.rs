//! Transport seam between the cache and the REST API.
//!
//! The cache core never talks HTTP directly; it hands an [`ApiRequest`]
//! to a [`Transport`] and gets a JSON value or a typed error back. The
//! production implementation is [`HttpTransport`] over `reqwest`; tests
//! inject in-memory transports to script responses and count calls.
//!
//! The transport owns timeout policy. The cache layer imposes none of
//! its own.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::{Result, StockpileError};

/// One HTTP request as described by an endpoint descriptor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/api/sales-orders/42`.
    pub path: String,
    /// Query parameters, already sorted by name.
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Executes API requests on behalf of the cache.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Value>;
}

/// `reqwest`-backed transport.
///
/// Error mapping:
/// - transport failure without an HTTP response → [`StockpileError::Network`]
/// - non-2xx response → [`StockpileError::Http`]
/// - 400-class response with a per-field `errors` map →
///   [`StockpileError::Validation`]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Use a pre-configured client (timeouts, proxies, default headers).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.client.request(request.method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| StockpileError::Network(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| StockpileError::Network(err.to_string()))?;

        if status.is_success() {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text)?);
        }

        Err(error_from_response(status.as_u16(), &text))
    }
}

/// Map a non-2xx response body to the error taxonomy.
fn error_from_response(status: u16, body: &str) -> StockpileError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("HTTP {status}")
            } else {
                body.to_string()
            }
        });

    if (400..500).contains(&status) {
        if let Some(fields) = parsed
            .as_ref()
            .and_then(|v| v.get("errors"))
            .and_then(Value::as_object)
        {
            let fields = fields
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|msg| (k.clone(), msg.to_string())))
                .collect();
            return StockpileError::Validation { message, fields };
        }
    }

    StockpileError::Http { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_needs_field_map() {
        let err = error_from_response(400, r#"{"message": "nope"}"#);
        assert!(matches!(err, StockpileError::Http { status: 400, .. }));

        let err = error_from_response(400, r#"{"message": "nope", "errors": {"name": "required"}}"#);
        match err {
            StockpileError::Validation { message, fields } => {
                assert_eq!(message, "nope");
                assert_eq!(fields.get("name").map(String::as_str), Some("required"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn server_errors_are_http() {
        let err = error_from_response(503, "");
        match err {
            StockpileError::Http { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "HTTP 503");
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("http://example.test/");
        assert_eq!(transport.base_url(), "http://example.test");
    }
}
