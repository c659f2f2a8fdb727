//! Core types for the GLM chat client
//!
//! Everything that crosses the wire lives here: the conversation turns that make up the
//! history log, the request payload, tool declarations, and the events produced while
//! reading a streamed response.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies who authored a [`ConversationTurn`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input typed by the caller
    User,
    /// Model output, possibly carrying tool calls
    Assistant,
    /// Result of a tool invocation fed back to the model
    Tool,
}

/// One entry in the conversation log.
///
/// Turns are appended in call order and never modified afterwards. The log has no IDs;
/// position is the only index used when the history is replayed to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Author of the turn
    pub role: Role,

    /// Text content, absent for assistant turns that only carry tool calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Tool calls requested by the assistant, in arrival order
    #[serde(rename = "toolCalls", default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ConversationTurn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Creates an assistant turn from folded text and tool calls.
    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls,
        }
    }

    /// Creates a tool-result turn.
    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// A tool call fragment emitted by the model.
///
/// `arguments` is kept as the raw string the endpoint sent; the client never parses it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, when the endpoint provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Call kind, normally `"function"`
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Position of the call within the assistant turn
    #[serde(default)]
    pub index: u32,

    /// Function name and arguments
    pub function: FunctionCall,
}

/// Function name plus its un-parsed argument string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Thinking-mode block. Its absence from a request means thinking is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thinking {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Thinking {
    /// The only block value the endpoint understands.
    pub fn enabled() -> Self {
        Self {
            kind: "enabled".to_string(),
        }
    }
}

/// A tool the model may use during a call.
///
/// Serializes as `{"type": "function", "function": {...}}` or
/// `{"type": "web_search", "web_search": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolDeclaration {
    Function { function: FunctionDeclaration },
    WebSearch { web_search: WebSearchConfig },
}

/// A callable function described by name, purpose and a JSON-schema parameter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// How recent web search results must be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchRecency {
    #[default]
    #[serde(rename = "noLimit")]
    NoLimit,
    #[serde(rename = "oneDay")]
    OneDay,
    #[serde(rename = "oneWeek")]
    OneWeek,
}

impl SearchRecency {
    /// Wire value of the filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchRecency::NoLimit => "noLimit",
            SearchRecency::OneDay => "oneDay",
            SearchRecency::OneWeek => "oneWeek",
        }
    }
}

impl FromStr for SearchRecency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "noLimit" => Ok(SearchRecency::NoLimit),
            "oneDay" => Ok(SearchRecency::OneDay),
            "oneWeek" => Ok(SearchRecency::OneWeek),
            other => Err(Error::invalid_option(format!(
                "invalid search recency filter: {} (valid: noLimit, oneDay, oneWeek)",
                other
            ))),
        }
    }
}

impl fmt::Display for SearchRecency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much page content each web search result carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSize {
    Low,
    #[default]
    Medium,
    High,
}

impl ContentSize {
    /// Wire value of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSize::Low => "low",
            ContentSize::Medium => "medium",
            ContentSize::High => "high",
        }
    }
}

impl FromStr for ContentSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(ContentSize::Low),
            "medium" => Ok(ContentSize::Medium),
            "high" => Ok(ContentSize::High),
            other => Err(Error::invalid_option(format!(
                "invalid content size: {} (valid: low, medium, high)",
                other
            ))),
        }
    }
}

impl fmt::Display for ContentSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Web search parameters attached to a `web_search` tool declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchConfig {
    pub search_engine: String,
    pub search_recency_filter: SearchRecency,
    pub count: u32,
    pub search_intent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_domain_filter: Option<String>,
    pub content_size: ContentSize,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            search_engine: "search_std".to_string(),
            search_recency_filter: SearchRecency::NoLimit,
            count: 10,
            search_intent: false,
            search_domain_filter: None,
            content_size: ContentSize::Medium,
        }
    }
}

/// The payload of one outbound call.
///
/// Built fresh for every call by [`crate::build_request`] and serialized once; it is never
/// touched again after being handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,

    #[serde(rename = "modelId")]
    pub model_id: u32,

    /// Turns sent to the model, oldest first
    pub prompt: Vec<ConversationTurn>,

    /// Always `true`; the client only speaks the streaming protocol
    pub stream: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<Thinking>,

    pub max_tokens: u32,

    pub temperature: f64,

    pub top_p: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclaration>,
}

/// One decoded update from the response stream.
///
/// Usually exactly one of `think`, `text`, `tool_call` or `error` is set, but nothing
/// enforces that: the upstream payload is loosely typed, so consumers should inspect
/// every field. `raw` keeps the full parsed payload for fields this type does not model.
#[derive(Debug, Default)]
pub struct StreamEvent {
    /// SSE event name (`message`, `functionHit`, ...)
    pub event: String,

    /// Reasoning delta from thinking mode
    pub think: Option<String>,

    /// Answer text delta
    pub text: Option<String>,

    /// Tool call fragment
    pub tool_call: Option<ToolCall>,

    /// Parsed payload, verbatim
    pub raw: serde_json::Map<String, serde_json::Value>,

    /// Set when this event reports a failure
    pub error: Option<Error>,
}

impl StreamEvent {
    /// Wraps an error as an in-band event.
    pub fn from_error(error: Error) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Returns true if this event carries an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns true if the event contributes text or a tool call to the assistant turn.
    pub fn has_content(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty()) || self.tool_call.is_some()
    }
}
