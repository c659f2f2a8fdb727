//! # GLM Chat - Streaming Client
//!
//! A streaming-first Rust client for a GLM text-generation endpoint that answers over
//! Server-Sent Events.
//!
//! ## Overview
//!
//! Responses arrive as an ordered stream of [`StreamEvent`]s while the client keeps the
//! multi-turn conversation state for you, including tool-call round-trips.
//!
//! ## Key Features
//!
//! - **Streaming Responses**: text, reasoning ("thinking") and tool-call deltas as they arrive
//! - **Conversation History**: user, assistant and tool turns replayed on every call
//! - **Tool Calling**: function declarations and built-in web search
//! - **Validated Options**: invalid temperatures, token limits or search settings fail at
//!   construction time, before any network activity
//! - **Backpressure and Cancellation**: bounded channels and per-call cancellation tokens
//!
//! ## Two Interaction Modes
//!
//! ### 1. Stateless Chat (`Client::chat`)
//!
//! ```rust,no_run
//! use glm_chat::{ChatOption, Client, ClientConfig};
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::from_env()?)?;
//!     let cancel = CancellationToken::new();
//!
//!     let mut events = client
//!         .chat(&cancel, "Hello!", vec![ChatOption::max_tokens(1000)?])
//!         .await?;
//!
//!     while let Some(event) = events.next().await {
//!         if let Some(error) = event.error {
//!             return Err(error.into());
//!         }
//!         print!("{}", event.text.unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### 2. Conversation (`Client::chat_with_history`)
//!
//! ```rust,no_run
//! use glm_chat::{Client, ClientConfig};
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//!
//! let mut events = client.chat_with_history(&cancel, "My name is Alex", Vec::new()).await?;
//! while let Some(event) = events.next().await {
//!     print!("{}", event.text.unwrap_or_default());
//! }
//!
//! // The model sees the previous exchange
//! let mut events = client.chat_with_history(&cancel, "What's my name?", Vec::new()).await?;
//! while let Some(event) = events.next().await {
//!     print!("{}", event.text.unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **options**: per-call option deltas with construction-time validation
//! - **request**: assembles one request payload per call
//! - **sse**: SSE frame parser and byte-stream frame reader
//! - **decoder**: frame payload to [`StreamEvent`]
//! - **history**: shared conversation log and the assistant-turn fold
//! - **client**: streaming orchestrator
//! - **transport**: the HTTP boundary
//! - **config**: client-wide settings and environment overrides
//! - **tools**: function declaration builder
//! - **types**: wire and event types
//! - **error**: error type and `Result` alias

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

/// Streaming orchestrator: dispatch, background pump and history fold tasks.
mod client;

/// Client-wide configuration with builder and environment overrides.
mod config;

/// Converts SSE frame payloads into typed stream events.
mod decoder;

/// Error types and the crate-wide `Result` alias.
mod error;

/// Shared conversation log and assistant-turn accumulation.
mod history;

/// Per-call option deltas.
mod options;

/// Request assembly for a single call.
mod request;

/// Function declaration builder with JSON schema normalization.
mod tools;

/// Core data types.
mod types;

/// Server-Sent Events framing. Public so frames can be read from any byte stream.
pub mod sse;

/// HTTP transport boundary. Public so custom transports can be plugged in.
pub mod transport;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================

// --- Client ---

pub use client::{Client, EventStream};

// --- Configuration ---

pub use config::{ClientConfig, ClientConfigBuilder, get_base_url};

// --- Decoding ---

pub use decoder::decode_event;

// --- Error Handling ---

pub use error::{Error, Result};

// --- History ---

pub use history::{History, TurnAccumulator};

// --- Options ---

pub use options::{ChatOption, WebSearchOption};

// --- Request Assembly ---

pub use request::{build_request, with_history};

// --- Tools ---

pub use tools::{FunctionBuilder, function};

// --- Transport ---

pub use transport::{HttpTransport, Transport, TransportResponse};

/// Per-call cancellation signal accepted by [`Client::chat`] and [`Client::chat_with_history`].
pub use tokio_util::sync::CancellationToken;

// --- Core Types ---

pub use types::{
    ChatRequest, ContentSize, ConversationTurn, FunctionCall, FunctionDeclaration, Role,
    SearchRecency, StreamEvent, Thinking, ToolCall, ToolDeclaration, WebSearchConfig,
};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// Commonly used types. Import with `use glm_chat::prelude::*;`.
pub mod prelude {
    pub use crate::{
        CancellationToken, ChatOption, Client, ClientConfig, ConversationTurn, Error, EventStream,
        Result, Role, StreamEvent, ToolCall, WebSearchOption, function,
    };
}
