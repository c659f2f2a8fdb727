//! The HTTP boundary.
//!
//! The client issues exactly one POST per conversational turn and reads the response body
//! as raw bytes. Everything about *how* that POST reaches the endpoint (connection pooling,
//! TLS, credentials, custom headers) sits behind [`Transport`], so the streaming engine can
//! run against a real endpoint through [`HttpTransport`] or against a scripted body in tests.

use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::pin::Pin;
use std::time::Duration;

/// Raw response body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Status line plus streaming body of one response.
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, read lazily
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Sends a serialized request and hands back the streaming response.
///
/// Implementations should return `Err` only when no response was obtained at all; a
/// response with any status is returned as-is and judged by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, body: Vec<u8>) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
}

impl HttpTransport {
    /// Builds the HTTP client and the header set from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built or a header is invalid.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout()))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = config.auth_token() {
            let value = HeaderValue::from_str(token)
                .map_err(|e| Error::config(format!("invalid auth token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in config.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        Ok(Self {
            client,
            url: config.base_url().to_string(),
            headers,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, body: Vec<u8>) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(Error::Http)?;

        let status = response.status().as_u16();
        let body = response.bytes_stream().map(|chunk| chunk.map_err(Error::Http));

        Ok(TransportResponse::new(status, Box::pin(body)))
    }
}

/// Longest error body kept in [`Error::Api`].
pub(crate) const MAX_ERROR_BODY: usize = 8 * 1024;

/// Drains up to [`MAX_ERROR_BODY`] bytes of a failed response for the error message.
pub(crate) async fn read_error_body(mut body: ByteStream) -> String {
    let mut collected = Vec::new();
    while collected.len() < MAX_ERROR_BODY {
        match body.next().await {
            Some(Ok(chunk)) => collected.extend_from_slice(&chunk),
            Some(Err(e)) => {
                log::warn!("Failed to read error response body: {}", e);
                if collected.is_empty() {
                    return "Unknown error (failed to read response body)".to_string();
                }
                break;
            }
            None => break,
        }
    }
    collected.truncate(MAX_ERROR_BODY);
    String::from_utf8_lossy(&collected).into_owned()
}
