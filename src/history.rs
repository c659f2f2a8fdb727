//! Conversation history.
//!
//! [`History`] is the append-only log a [`crate::Client`] replays on every history-aware
//! call. It is a cheap cloneable handle: the client and its background fold tasks share one
//! log behind a lock, so concurrent callers always see whole turns.
//!
//! [`TurnAccumulator`] implements the fold. While a response streams in, text deltas and
//! tool call fragments are gathered locally; when the stream completes they become a single
//! assistant turn. Nothing is committed for a stream that produced neither, or one that
//! ended in an error.

use crate::types::{ConversationTurn, StreamEvent, ToolCall};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared, ordered conversation log.
#[derive(Debug, Clone, Default)]
pub struct History {
    turns: Arc<RwLock<Vec<ConversationTurn>>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn.
    pub fn push(&self, turn: ConversationTurn) {
        self.turns.write().push(turn);
    }

    /// Appends a user turn and returns a snapshot that includes it, under one lock.
    pub(crate) fn push_user_and_snapshot(&self, content: &str) -> Vec<ConversationTurn> {
        let mut turns = self.turns.write();
        if !content.is_empty() {
            turns.push(ConversationTurn::user(content));
        }
        turns.clone()
    }

    /// Appends a `tool` turn carrying a function result.
    pub fn push_tool_response(&self, content: impl Into<String>) {
        self.push(ConversationTurn::tool(content));
    }

    /// Returns an independent copy of the log.
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns.read().clone()
    }

    /// Empties the log. In-flight requests keep the snapshot they were built with.
    pub fn clear(&self) {
        self.turns.write().clear();
    }

    pub fn len(&self) -> usize {
        self.turns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.read().is_empty()
    }
}

/// Collects one response's deltas into an assistant turn.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    text: String,
    tool_calls: Vec<ToolCall>,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the text delta and tool call fragment of `event`, if any.
    ///
    /// Reasoning-only, empty and error events leave the accumulator untouched.
    pub fn observe(&mut self, event: &StreamEvent) {
        if event.is_error() || !event.has_content() {
            return;
        }
        if let Some(text) = &event.text {
            self.text.push_str(text);
        }
        if let Some(tool_call) = &event.tool_call {
            self.tool_calls.push(tool_call.clone());
        }
    }

    /// Returns true if nothing worth committing has been seen.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tool_calls.is_empty()
    }

    /// Produces the assistant turn, or `None` when there is nothing to commit.
    pub fn into_turn(self) -> Option<ConversationTurn> {
        if self.is_empty() {
            return None;
        }
        let content = (!self.text.is_empty()).then_some(self.text);
        Some(ConversationTurn::assistant(content, self.tool_calls))
    }
}
