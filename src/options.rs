//! Per-call request options.
//!
//! Every option is a tagged delta applied, in order, to a fresh [`ChatRequest`] by
//! [`crate::build_request`]. Scalar options follow last-write-wins; tool options append one
//! declaration each, so several functions and web searches can coexist.
//!
//! Options that carry a constrained value are validated when they are constructed, not when
//! they are applied. The validating constructors return [`Result`], so an invalid value stops
//! the caller before any request exists:
//!
//! ```rust
//! use glm_chat::{ChatOption, WebSearchOption};
//!
//! # fn example() -> glm_chat::Result<()> {
//! let options = vec![
//!     ChatOption::system_prompt("You are a helpful coding assistant"),
//!     ChatOption::temperature(0.8)?,
//!     ChatOption::max_tokens(500)?,
//!     ChatOption::web_search([
//!         WebSearchOption::recency("oneDay")?,
//!         WebSearchOption::intent(true),
//!     ]),
//! ];
//! # assert_eq!(options.len(), 4);
//! # Ok(())
//! # }
//! ```

use crate::types::{
    ChatRequest, ContentSize, FunctionDeclaration, SearchRecency, Thinking, ToolDeclaration,
    WebSearchConfig,
};
use crate::{Error, Result};

/// Inclusive temperature range accepted by the endpoint.
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;

/// Inclusive range for the number of web search results.
pub const SEARCH_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// A single configuration delta for one chat call.
///
/// Opaque: the constructors below are the only way to obtain one, so a value that reaches a
/// request has always been validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOption(OptionKind);

#[derive(Debug, Clone, PartialEq)]
enum OptionKind {
    SystemPrompt(String),
    Temperature(f64),
    MaxTokens(u32),
    TopP(f64),
    /// `false` removes the thinking block
    Thinking(bool),
    WebSearch(WebSearchConfig),
    Function(FunctionDeclaration),
}

impl ChatOption {
    /// Sets the system prompt that defines the assistant's behavior.
    pub fn system_prompt(prompt: impl Into<String>) -> Self {
        ChatOption(OptionKind::SystemPrompt(prompt.into()))
    }

    /// Sets the sampling temperature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] when `temperature` is outside `0.0..=2.0` (or NaN).
    pub fn temperature(temperature: f64) -> Result<Self> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(Error::invalid_option(format!(
                "temperature must be between 0.0 and 2.0, got: {:.2}",
                temperature
            )));
        }
        Ok(ChatOption(OptionKind::Temperature(temperature)))
    }

    /// Sets the maximum number of tokens in the response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] when `tokens` is zero.
    pub fn max_tokens(tokens: u32) -> Result<Self> {
        if tokens == 0 {
            return Err(Error::invalid_option(format!(
                "max_tokens must be greater than 0, got: {}",
                tokens
            )));
        }
        Ok(ChatOption(OptionKind::MaxTokens(tokens)))
    }

    /// Sets nucleus sampling probability mass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] unless `0.0 < top_p <= 1.0`.
    pub fn top_p(top_p: f64) -> Result<Self> {
        if !(top_p > 0.0 && top_p <= 1.0) {
            return Err(Error::invalid_option(format!(
                "top_p must be in (0.0, 1.0], got: {:.2}",
                top_p
            )));
        }
        Ok(ChatOption(OptionKind::TopP(top_p)))
    }

    /// Enables or disables thinking mode.
    ///
    /// Disabling removes the thinking block from the request entirely.
    pub fn thinking(enabled: bool) -> Self {
        ChatOption(OptionKind::Thinking(enabled))
    }

    /// Appends a web search tool configured by `options`, starting from
    /// [`WebSearchConfig::default`].
    pub fn web_search(options: impl IntoIterator<Item = WebSearchOption>) -> Self {
        let mut config = WebSearchConfig::default();
        for option in options {
            option.apply(&mut config);
        }
        ChatOption(OptionKind::WebSearch(config))
    }

    /// Appends a function the model may call. `parameters` is sent as given.
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        ChatOption(OptionKind::Function(FunctionDeclaration {
            name: name.into(),
            description: description.into(),
            parameters: Some(parameters),
        }))
    }

    /// Applies this delta to a request under construction.
    pub(crate) fn apply(self, request: &mut ChatRequest) {
        match self.0 {
            OptionKind::SystemPrompt(prompt) => request.system_prompt = Some(prompt),
            OptionKind::Temperature(temperature) => request.temperature = temperature,
            OptionKind::MaxTokens(tokens) => request.max_tokens = tokens,
            OptionKind::TopP(top_p) => request.top_p = top_p,
            OptionKind::Thinking(true) => request.thinking = Some(Thinking::enabled()),
            OptionKind::Thinking(false) => request.thinking = None,
            OptionKind::WebSearch(web_search) => request
                .tools
                .push(ToolDeclaration::WebSearch { web_search }),
            OptionKind::Function(function) => {
                request.tools.push(ToolDeclaration::Function { function })
            }
        }
    }
}

impl From<FunctionDeclaration> for ChatOption {
    fn from(function: FunctionDeclaration) -> Self {
        ChatOption(OptionKind::Function(function))
    }
}

/// A single configuration delta for a web search tool.
///
/// Opaque like [`ChatOption`]; build it with the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSearchOption(SearchOptionKind);

#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchOptionKind {
    Recency(SearchRecency),
    Domain(String),
    Intent(bool),
    Count(u32),
    ContentSize(ContentSize),
}

impl WebSearchOption {
    /// Sets the recency filter from its wire name (`noLimit`, `oneDay`, `oneWeek`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for any other value.
    pub fn recency(filter: &str) -> Result<Self> {
        filter
            .parse()
            .map(|recency| WebSearchOption(SearchOptionKind::Recency(recency)))
    }

    /// Limits results to one domain, e.g. `github.com`.
    pub fn domain(domain: impl Into<String>) -> Self {
        WebSearchOption(SearchOptionKind::Domain(domain.into()))
    }

    /// Enables or disables search intent detection.
    pub fn intent(enabled: bool) -> Self {
        WebSearchOption(SearchOptionKind::Intent(enabled))
    }

    /// Sets the number of results to retrieve.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] when `count` is outside `1..=100`.
    pub fn count(count: u32) -> Result<Self> {
        if !SEARCH_COUNT_RANGE.contains(&count) {
            return Err(Error::invalid_option(format!(
                "search count must be between 1 and 100, got: {}",
                count
            )));
        }
        Ok(WebSearchOption(SearchOptionKind::Count(count)))
    }

    /// Sets the content tier from its wire name (`low`, `medium`, `high`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for any other value.
    pub fn content_size(size: &str) -> Result<Self> {
        size
            .parse()
            .map(|size| WebSearchOption(SearchOptionKind::ContentSize(size)))
    }

    fn apply(self, config: &mut WebSearchConfig) {
        match self.0 {
            SearchOptionKind::Recency(recency) => config.search_recency_filter = recency,
            SearchOptionKind::Domain(domain) => config.search_domain_filter = Some(domain),
            SearchOptionKind::Intent(enabled) => config.search_intent = enabled,
            SearchOptionKind::Count(count) => config.count = count,
            SearchOptionKind::ContentSize(size) => config.content_size = size,
        }
    }
}

impl From<SearchRecency> for WebSearchOption {
    fn from(recency: SearchRecency) -> Self {
        WebSearchOption(SearchOptionKind::Recency(recency))
    }
}

impl From<ContentSize> for WebSearchOption {
    fn from(size: ContentSize) -> Self {
        WebSearchOption(SearchOptionKind::ContentSize(size))
    }
}
