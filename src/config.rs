//! Configuration for the GLM chat client
//!
//! [`ClientConfig`] carries everything that stays fixed across calls: where the endpoint
//! lives, which model it serves, the header material the transport injects, and the
//! defaults every [`crate::ChatRequest`] starts from. Per-call tuning goes through
//! [`crate::ChatOption`] instead.

use crate::options::TEMPERATURE_RANGE;
use crate::{Error, Result};
use std::env;

/// Endpoint used when neither the builder nor the environment supplies one.
pub const DEFAULT_BASE_URL: &str = "https://www.bigmodel.cn/api/biz/trial/response/v4/sse/11170";

/// The single model the endpoint serves.
pub const DEFAULT_MODEL: &str = "glm-4.6";

/// Numeric identifier of [`DEFAULT_MODEL`].
pub const DEFAULT_MODEL_ID: u32 = 11170;

pub const DEFAULT_MAX_TOKENS: u32 = 65536;
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_P: f64 = 0.95;

/// Capacity of the bounded event channel between the network reader and the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Whole-request timeout, in seconds.
pub const DEFAULT_TIMEOUT: u64 = 300;

/// Environment variable overriding the endpoint.
pub const ENV_BASE_URL: &str = "GLM_CHAT_BASE_URL";
/// Environment variable overriding the model name.
pub const ENV_MODEL: &str = "GLM_CHAT_MODEL";
/// Environment variable carrying the `Authorization` header value.
pub const ENV_AUTH_TOKEN: &str = "GLM_CHAT_AUTH_TOKEN";

/// Client-wide settings.
///
/// Only obtainable through [`ClientConfig::builder`], [`ClientConfig::from_env`] or
/// [`Default`], so every instance has passed validation.
#[derive(Clone)]
pub struct ClientConfig {
    /// Full URL the chat request is POSTed to
    base_url: String,

    /// Model name sent with every request
    model: String,

    /// Numeric model identifier sent as `modelId`
    model_id: u32,

    /// Sent verbatim as the `Authorization` header when present
    auth_token: Option<String>,

    /// Extra headers the transport attaches to every request
    headers: Vec<(String, String)>,

    /// Whole-request timeout in seconds
    timeout: u64,

    /// Bounded channel size for streamed events
    channel_capacity: usize,

    /// Default `max_tokens` for each request
    max_tokens: u32,

    /// Default sampling temperature
    temperature: f64,

    /// Default nucleus sampling value
    top_p: f64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("model_id", &self.model_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("headers", &format!("{} headers", self.headers.len()))
            .field("timeout", &self.timeout)
            .field("channel_capacity", &self.channel_capacity)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_id: DEFAULT_MODEL_ID,
            auth_token: None,
            headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl ClientConfig {
    /// Creates a new builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn model_id(&self) -> u32 {
        self.model_id
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Extra headers, in the order they were added.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Whole-request timeout in seconds.
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    /// Bounded event channel size; always greater than zero.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn top_p(&self) -> f64 {
        self.top_p
    }

    /// Builds a configuration from defaults overlaid with the `GLM_CHAT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut builder = ClientConfig::builder().base_url(get_base_url(None));
        if let Ok(model) = env::var(ENV_MODEL) {
            builder = builder.model(model);
        }
        if let Ok(token) = env::var(ENV_AUTH_TOKEN) {
            builder = builder.auth_token(token);
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    model: Option<String>,
    model_id: Option<u32>,
    auth_token: Option<String>,
    headers: Vec<(String, String)>,
    timeout: Option<u64>,
    channel_capacity: Option<usize>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
    top_p: Option<f64>,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn model_id(mut self, id: u32) -> Self {
        self.model_id = Some(id);
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Adds one header the transport sends with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL is empty or unparseable, the channel
    /// capacity or token default is zero, the sampling defaults are out of range, or a
    /// header name or value is not valid HTTP.
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(Error::config("base_url must not be empty"));
        }
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::config(format!("invalid base_url {}: {}", base_url, e)))?;

        let channel_capacity = self.channel_capacity.unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        if channel_capacity == 0 {
            return Err(Error::config("channel_capacity must be greater than 0"));
        }

        let max_tokens = self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(Error::config("max_tokens must be greater than 0"));
        }

        let temperature = self.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0.0 and 2.0, got: {:.2}",
                temperature
            )));
        }

        let top_p = self.top_p.unwrap_or(DEFAULT_TOP_P);
        if !(top_p > 0.0 && top_p <= 1.0) {
            return Err(Error::config(format!(
                "top_p must be in (0.0, 1.0], got: {:.2}",
                top_p
            )));
        }

        for (name, value) in &self.headers {
            reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name {}: {}", name, e)))?;
            reqwest::header::HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid value for header {}: {}", name, e)))?;
        }

        Ok(ClientConfig {
            base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_id: self.model_id.unwrap_or(DEFAULT_MODEL_ID),
            auth_token: self.auth_token,
            headers: self.headers,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            channel_capacity,
            max_tokens,
            temperature,
            top_p,
        })
    }
}

/// Resolves the endpoint: `GLM_CHAT_BASE_URL`, then `fallback`, then [`DEFAULT_BASE_URL`].
pub fn get_base_url(fallback: Option<&str>) -> String {
    if let Ok(url) = env::var(ENV_BASE_URL) {
        return url;
    }

    fallback.unwrap_or(DEFAULT_BASE_URL).to_string()
}
