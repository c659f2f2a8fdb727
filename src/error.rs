//! Error types for the GLM chat client

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the client.
///
/// Errors fall into three groups:
///
/// - **Construction errors** (`InvalidOption`, `Config`): returned while building options or
///   configuration, before any network activity happens.
/// - **Dispatch errors** (`Http`, `Json`, `Api`): returned directly from [`crate::Client::chat`]
///   and [`crate::Client::chat_with_history`] when the request cannot be issued. No event stream
///   is created in that case.
/// - **Stream errors** (`Http`, `Json`, `Stream`, `Decode`, `Cancelled`): delivered in-band through
///   [`crate::StreamEvent::error`] once a stream exists.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Option value rejected at construction time
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Non-success status returned by the endpoint
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// Malformed SSE stream
    #[error("Streaming error: {0}")]
    Stream(String),

    /// Frame payload did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// The call was cancelled through its cancellation token
    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new invalid option error
    pub fn invalid_option(msg: impl Into<String>) -> Self {
        Error::InvalidOption(msg.into())
    }

    /// Create a new API error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Error::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a new stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Error::Stream(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Error::Decode(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled() -> Self {
        Error::Cancelled
    }
}
