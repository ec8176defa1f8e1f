//! Backend HTTP collaborator
//!
//! [`ApiTransport`] is the seam between the reconciler and the network: one
//! call per HTTP verb, each returning the decoded response envelope. The
//! production implementation is [`HttpTransport`] (reqwest); tests supply an
//! in-memory backend.
//!
//! A call fails with [`TransportError::Envelope`] when the backend answered
//! but rejected the request (non-2xx status or `success: false`), and with
//! [`TransportError::Transport`] when no usable envelope came back at all.

use crate::error::PerformaError;
use async_trait::async_trait;
use kop_common::api::ApiResponse;
use kop_common::config::ResolvedConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("kop-performa/", env!("CARGO_PKG_VERSION"));

/// Longest slice of a non-JSON body kept for diagnostics
const BODY_EXCERPT_LEN: usize = 200;

/// HTTP collaborator failure
#[derive(Debug, Error)]
pub enum TransportError {
    /// Backend answered with an error envelope
    #[error("Backend rejected request (HTTP {status:?}): {}", .envelope.message)]
    Envelope {
        status: Option<u16>,
        envelope: ApiResponse<Value>,
    },

    /// Network failure, timeout, or an unparseable response body
    #[error("Transport error (HTTP {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Envelope { status, .. } | TransportError::Transport { status, .. } => {
                *status
            }
        }
    }

    /// Whether the backend reported that the requested resource does not exist
    ///
    /// True for HTTP 404, or an error envelope whose message says "not found"
    /// in English or Indonesian.
    pub fn is_not_found(&self) -> bool {
        if self.status() == Some(404) {
            return true;
        }
        match self {
            TransportError::Envelope { envelope, .. } => {
                let message = envelope.message.to_lowercase();
                message.contains("not found") || message.contains("tidak ditemukan")
            }
            TransportError::Transport { .. } => false,
        }
    }

    /// Convert into a user-facing failure
    ///
    /// Message priority: backend message, first validation error, `fallback`.
    pub fn into_remote_failure(self, fallback: &str) -> PerformaError {
        tracing::warn!(error = %self, "Backend call failed");
        let status = self.status();
        let message = match &self {
            TransportError::Envelope { envelope, .. } => {
                envelope.user_message().unwrap_or(fallback).to_string()
            }
            TransportError::Transport { .. } => fallback.to_string(),
        };
        PerformaError::RemoteFailure { status, message }
    }
}

/// One method per HTTP verb against the backend API
///
/// `path` is relative to the API base URL and starts with `/`.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get(&self, path: &str) -> Result<ApiResponse<Value>, TransportError>;

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse<Value>, TransportError>;

    async fn put(&self, path: &str, body: Value) -> Result<ApiResponse<Value>, TransportError>;

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, TransportError>;
}

#[async_trait]
impl<T: ApiTransport + ?Sized> ApiTransport for Arc<T> {
    async fn get(&self, path: &str) -> Result<ApiResponse<Value>, TransportError> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse<Value>, TransportError> {
        (**self).post(path, body).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<ApiResponse<Value>, TransportError> {
        (**self).put(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, TransportError> {
        (**self).delete(path).await
    }
}

/// reqwest-backed transport
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for `base_url` (no trailing slash)
    ///
    /// When `token` is given it is sent as a bearer token on every request.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, PerformaError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                kop_common::Error::Config("API token contains invalid header characters".to_string())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                kop_common::Error::Config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ResolvedConfig) -> Result<Self, PerformaError> {
        Self::new(&config.base_url, config.token.as_deref(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<Value>, TransportError> {
        let response = request.send().await.map_err(|e| TransportError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        let code = Some(status.as_u16());
        let body = response.text().await.map_err(|e| TransportError::Transport {
            status: code,
            message: format!("Failed to read response body: {}", e),
        })?;

        tracing::debug!(method, status = status.as_u16(), bytes = body.len(), "Backend responded");

        // 204 and friends
        if status.is_success() && body.trim().is_empty() {
            let mut envelope = ApiResponse::failure("");
            envelope.success = true;
            return Ok(envelope);
        }

        let envelope = match serde_json::from_str::<ApiResponse<Value>>(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Err(TransportError::Transport {
                    status: code,
                    message: format!(
                        "Response is not a valid envelope ({}): {}",
                        e,
                        excerpt(&body)
                    ),
                })
            }
        };

        if !status.is_success() || !envelope.success {
            return Err(TransportError::Envelope {
                status: code,
                envelope,
            });
        }

        Ok(envelope)
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse<Value>, TransportError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");
        self.send("GET", self.http_client.get(&url)).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse<Value>, TransportError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");
        self.send("POST", self.http_client.post(&url).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> Result<ApiResponse<Value>, TransportError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "PUT");
        self.send("PUT", self.http_client.put(&url).json(&body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse<Value>, TransportError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "DELETE");
        self.send("DELETE", self.http_client.delete(&url)).await
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope_error(status: u16, message: &str) -> TransportError {
        TransportError::Envelope {
            status: Some(status),
            envelope: ApiResponse::failure(message),
        }
    }

    #[test]
    fn test_not_found_detection() {
        assert!(envelope_error(404, "").is_not_found());
        assert!(envelope_error(200, "Performa tidak ditemukan").is_not_found());
        assert!(envelope_error(422, "Performa Not Found").is_not_found());
        assert!(!envelope_error(500, "Server error").is_not_found());
        assert!(!TransportError::Transport {
            status: None,
            message: "connection refused".to_string()
        }
        .is_not_found());
    }

    #[test]
    fn test_remote_failure_message_priority() {
        let err = envelope_error(500, "Terjadi kesalahan").into_remote_failure("Gagal");
        assert_eq!(err.user_message(), "Terjadi kesalahan");

        let mut envelope = ApiResponse::<Value>::failure("");
        envelope.errors = Some(
            [("cdi".to_string(), vec!["CDI harus berupa angka".to_string()])]
                .into_iter()
                .collect(),
        );
        let err = TransportError::Envelope {
            status: Some(422),
            envelope,
        }
        .into_remote_failure("Gagal");
        assert_eq!(err.user_message(), "CDI harus berupa angka");

        let err = TransportError::Transport {
            status: None,
            message: "timeout".to_string(),
        }
        .into_remote_failure("Gagal menyimpan performa");
        assert_eq!(err.user_message(), "Gagal menyimpan performa");
        assert!(matches!(
            err,
            PerformaError::RemoteFailure { status: None, .. }
        ));
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT_LEN);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport =
            HttpTransport::new("http://localhost:8000/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8000/api");
        assert_eq!(
            transport.url("/organizations/7/performa"),
            "http://localhost:8000/api/organizations/7/performa"
        );
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = HttpTransport::new("http://localhost", Some("bad\ntoken"), Duration::from_secs(5));
        assert!(matches!(result, Err(PerformaError::Common(_))));
    }
}
