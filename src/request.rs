//! Request assembly.
//!
//! Turns caller input plus an ordered option list into the [`ChatRequest`] for exactly one
//! network call.

use crate::config::ClientConfig;
use crate::options::ChatOption;
use crate::types::{ChatRequest, ConversationTurn, Thinking};

/// Builds the request for a single call.
///
/// Defaults come from `config`: its model, token limit and sampling values, streaming on,
/// thinking enabled, no system prompt and no tools. The prompt holds a single user turn with
/// `content` (which may be empty). `options` are then applied in order.
///
/// History-aware calls replace the prompt afterwards with [`with_history`].
pub fn build_request(
    config: &ClientConfig,
    content: &str,
    options: impl IntoIterator<Item = ChatOption>,
) -> ChatRequest {
    let mut request = ChatRequest {
        model: config.model().to_string(),
        model_id: config.model_id(),
        prompt: vec![ConversationTurn::user(content)],
        stream: true,
        thinking: Some(Thinking::enabled()),
        max_tokens: config.max_tokens(),
        temperature: config.temperature(),
        top_p: config.top_p(),
        system_prompt: None,
        tools: Vec::new(),
    };

    for option in options {
        option.apply(&mut request);
    }

    request
}

/// Replaces the request's prompt with a snapshot of the conversation log.
pub fn with_history(mut request: ChatRequest, snapshot: Vec<ConversationTurn>) -> ChatRequest {
    request.prompt = snapshot;
    request
}
