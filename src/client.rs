//! Streaming client for single-turn and multi-turn chats
//!
//! This module ties the pieces of the client together: it assembles the request, hands it to
//! the [`Transport`], and runs the background tasks that turn the response body into
//! [`StreamEvent`]s for the caller.
//!
//! # Architecture Overview
//!
//! Every call follows the same pipeline:
//!
//! ```text
//! content + ChatOptions
//!     │
//!     ├─> build_request()            fresh ChatRequest for this call only
//!     │
//!     ├─> Transport::send()          one POST; non-2xx is returned as Error::Api
//!     │
//!     ├─> pump task                  FrameReader → decode_event → bounded channel
//!     │
//!     └─> (history-aware calls)      fold task: forward events, accumulate, commit
//! ```
//!
//! ## Two Entry Points
//!
//! - [`Client::chat`] is stateless: the request carries a single user turn and nothing is
//!   remembered afterwards.
//! - [`Client::chat_with_history`] appends the user turn to the log *before* dispatching,
//!   sends the whole log, and after a clean finish folds the streamed text and tool calls into
//!   one assistant turn. Pass empty content to continue after [`Client::add_tool_response`].
//!
//! ## Error Delivery
//!
//! A call either fails immediately (the request could not be serialized or sent, or the
//! endpoint answered with a non-success status) or returns an [`EventStream`]. From then on
//! failures arrive in-band as an event with [`StreamEvent::error`] set:
//!
//! - read failures and cancellation are the last event before the stream closes;
//! - undecodable frames are reported and the stateless stream keeps going;
//! - history-aware streams stop at the first error and commit nothing for that call.
//!
//! ## Backpressure and Cancellation
//!
//! Events travel through a bounded channel ([`ClientConfig::channel_capacity`]). A consumer that
//! stops reading stalls the pump task, which stalls the network read. Dropping the stream stops
//! both tasks without committing anything. Firing the call's [`CancellationToken`] aborts the read
//! promptly and closes the stream, usually after an [`Error::Cancelled`] event.
//!
//! ## Thread Safety
//!
//! `Client` methods take `&self`; share one client across tasks with `Arc`. The history log is
//! guarded by a lock, and each request is built from a copy of the log, so later mutations never
//! reach an in-flight request.
//!
//! # Examples
//!
//! ## Single-Turn Chat
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
//!         .chat(&cancel, "Hello!", vec![ChatOption::temperature(0.7)?])
//!         .await?;
//!
//!     while let Some(event) = events.next().await {
//!         if let Some(error) = event.error {
//!             return Err(error.into());
//!         }
//!         if let Some(text) = event.text {
//!             print!("{}", text);
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Tool Round-Trip
//!
//! ```rust,no_run
//! use glm_chat::{ChatOption, Client, ClientConfig, function};
//! use futures::StreamExt;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//! let weather = function("get_weather", "Get weather").param("location", "string").build();
//!
//! let mut events = client
//!     .chat_with_history(&cancel, "What's the weather in Moscow?", vec![weather.into()])
//!     .await?;
//!
//! let mut called = false;
//! while let Some(event) = events.next().await {
//!     if let Some(tool_call) = event.tool_call {
//!         println!("model wants {}({})", tool_call.function.name, tool_call.function.arguments);
//!         called = true;
//!     }
//! }
//!
//! if called {
//!     client.add_tool_response(r#"{"weather":"sunny"}"#);
//!     let mut events = client.chat_with_history(&cancel, "", Vec::new()).await?;
//!     while let Some(event) = events.next().await {
//!         print!("{}", event.text.unwrap_or_default());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::decoder::decode_event;
use crate::history::{History, TurnAccumulator};
use crate::options::ChatOption;
use crate::request::{build_request, with_history};
use crate::sse::FrameReader;
use crate::transport::{HttpTransport, Transport, read_error_body};
use crate::types::{ChatRequest, ConversationTurn, StreamEvent};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// Events of one call, in wire order. Ends when the call is finished.
///
/// Implements [`futures::Stream`]; use `StreamExt::next` to read it, or
/// [`ReceiverStream::into_inner`] to get the underlying channel receiver.
pub type EventStream = ReceiverStream<StreamEvent>;

/// Client for the streaming chat endpoint.
///
/// Owns its transport and its conversation log; separate clients share nothing.
pub struct Client {
    config: Arc<ClientConfig>,

    transport: Arc<dyn Transport>,

    history: History,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("history", &format!("{} turns", self.history.len()))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client that talks HTTP through [`HttpTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            history: History::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends a single message without touching the conversation history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be dispatched: serialization failure,
    /// connection failure, non-success status, or `cancel` firing before a response arrives.
    /// Later failures are delivered inside the stream.
    pub async fn chat(
        &self,
        cancel: &CancellationToken,
        content: &str,
        options: Vec<ChatOption>,
    ) -> Result<EventStream> {
        let request = build_request(&self.config, content, options);
        let events = self.stream(cancel, &request).await?;
        Ok(ReceiverStream::new(events))
    }

    /// Sends a message as the next turn of the conversation.
    ///
    /// Non-empty `content` is appended to the log as a user turn before the request goes out,
    /// and stays there even if dispatch fails. The request carries a copy of the whole log.
    /// Once the returned stream closes cleanly, the response's text and tool calls have been
    /// committed as one assistant turn; a stream that ends with an error commits nothing.
    ///
    /// # Errors
    ///
    /// Same as [`Client::chat`].
    pub async fn chat_with_history(
        &self,
        cancel: &CancellationToken,
        content: &str,
        options: Vec<ChatOption>,
    ) -> Result<EventStream> {
        let snapshot = self.history.push_user_and_snapshot(content);
        let request = with_history(build_request(&self.config, content, options), snapshot);

        let upstream = self.stream(cancel, &request).await?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity());
        tokio::spawn(fold_into_history(
            upstream,
            tx,
            self.history.clone(),
            cancel.clone(),
        ));
        Ok(ReceiverStream::new(rx))
    }

    /// Appends the result of a tool call as a `tool` turn.
    ///
    /// Call this after the assistant turn that requested the tool has been committed, then
    /// continue with `chat_with_history` and empty content.
    pub fn add_tool_response(&self, content: impl Into<String>) {
        self.history.push_tool_response(content);
    }

    /// Empties the conversation history.
    pub fn clear_history(&self) {
        self.history.clear();
    }

    /// Returns a copy of the conversation history, oldest turn first.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.history.snapshot()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Dispatches `request` and spawns the pump task for its response.
    async fn stream(
        &self,
        cancel: &CancellationToken,
        request: &ChatRequest,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let body = serde_json::to_vec(request)?;

        log::debug!(
            "Dispatching chat request: model={}, turns={}, tools={}",
            request.model,
            request.prompt.len(),
            request.tools.len()
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled()),
            response = self.transport.send(body) => response?,
        };

        if !response.is_success() {
            let status = response.status;
            let body = read_error_body(response.body).await;
            return Err(Error::api(status, body));
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity());
        tokio::spawn(pump_events(
            FrameReader::new(response.body),
            tx,
            cancel.clone(),
        ));
        Ok(rx)
    }
}

/// Reads frames off the wire, decodes them and pushes them to the consumer.
async fn pump_events(
    mut reader: FrameReader,
    tx: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                notify_cancelled(&tx);
                return;
            }
            _ = tx.closed() => {
                log::debug!("Event consumer dropped; stopping stream");
                return;
            }
            next = reader.next_frame() => next,
        };

        match next {
            Some(Ok(frame)) => {
                if !send_or_cancel(&tx, decode_event(&frame), &cancel).await {
                    return;
                }
            }
            Some(Err(error)) => {
                send_or_cancel(&tx, StreamEvent::from_error(error), &cancel).await;
                return;
            }
            None => return,
        }
    }
}

/// Forwards one call's events and commits the assistant turn when the call finishes cleanly.
async fn fold_into_history(
    mut upstream: mpsc::Receiver<StreamEvent>,
    tx: mpsc::Sender<StreamEvent>,
    history: History,
    cancel: CancellationToken,
) {
    let mut accumulator = TurnAccumulator::new();

    loop {
        let event = tokio::select! {
            _ = tx.closed() => {
                log::debug!("Event consumer dropped; assistant turn not committed");
                return;
            }
            event = upstream.recv() => event,
        };
        let Some(event) = event else {
            break;
        };

        let failed = event.is_error();
        if !failed {
            accumulator.observe(&event);
        }

        if !send_or_cancel(&tx, event, &cancel).await {
            log::debug!("Dropping uncommitted assistant turn");
            return;
        }
        if failed {
            log::debug!("Stream ended with an error; assistant turn not committed");
            return;
        }
    }

    if cancel.is_cancelled() {
        log::debug!("Call cancelled; assistant turn not committed");
        return;
    }

    if let Some(turn) = accumulator.into_turn() {
        log::debug!(
            "Committing assistant turn: {} chars, {} tool calls",
            turn.content.as_deref().map_or(0, str::len),
            turn.tool_calls.len()
        );
        history.push(turn);
    }
}

/// Sends `event` unless the call is cancelled first. Returns false when the caller should stop.
async fn send_or_cancel(
    tx: &mpsc::Sender<StreamEvent>,
    event: StreamEvent,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            notify_cancelled(tx);
            false
        }
        sent = tx.send(event) => {
            if sent.is_err() {
                log::debug!("Event consumer dropped; stopping stream");
            }
            sent.is_ok()
        }
    }
}

fn notify_cancelled(tx: &mpsc::Sender<StreamEvent>) {
    log::debug!("Chat stream cancelled");
    // Best effort: a full channel closes without the error event.
    let _ = tx.try_send(StreamEvent::from_error(Error::cancelled()));
}
