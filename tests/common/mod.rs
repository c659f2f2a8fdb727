//! Shared test helpers: a scripted in-memory transport.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use glm_chat::transport::ByteStream;
use glm_chat::{ClientConfig, Error, Result, Transport, TransportResponse};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// How the scripted body ends after its chunks are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    /// Clean end of stream
    Close,
    /// A transport read error
    ReadError,
    /// Never ends; only cancellation gets the reader out
    Hang,
}

/// One canned response.
#[derive(Debug, Clone)]
pub struct Script {
    pub status: u16,
    pub chunks: Vec<String>,
    pub ending: Ending,
}

impl Script {
    pub fn ok<S: AsRef<str>>(chunks: &[S]) -> Self {
        Self {
            status: 200,
            chunks: chunks.iter().map(|c| c.as_ref().to_string()).collect(),
            ending: Ending::Close,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            chunks: vec![body.to_string()],
            ending: Ending::Close,
        }
    }

    pub fn ending(mut self, ending: Ending) -> Self {
        self.ending = ending;
        self
    }
}

/// Transport that replays scripts in order and records every request body.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Request bodies received so far, as JSON.
    pub fn requests(&self) -> Vec<serde_json::Value> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, body: Vec<u8>) -> Result<TransportResponse> {
        self.requests.lock().push(serde_json::from_slice(&body)?);

        let script = self
            .scripts
            .lock()
            .pop_front()
            .ok_or_else(|| Error::stream("no scripted response left"))?;

        let chunks = futures::stream::iter(
            script
                .chunks
                .into_iter()
                .map(|c| Ok(Bytes::from(c)))
                .collect::<Vec<Result<Bytes>>>(),
        );

        let body: ByteStream = match script.ending {
            Ending::Close => Box::pin(chunks),
            Ending::ReadError => Box::pin(chunks.chain(futures::stream::once(async {
                Err(Error::stream("connection reset by peer"))
            }))),
            Ending::Hang => Box::pin(chunks.chain(futures::stream::pending())),
        };

        Ok(TransportResponse::new(script.status, body))
    }
}

/// Builds one `event:`/`data:` frame terminated by a blank line.
pub fn frame(event: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

pub fn text_frame(text: &str) -> String {
    frame("message", &serde_json::json!({ "text": text }).to_string())
}

pub fn config() -> ClientConfig {
    ClientConfig::builder()
        .base_url("http://localhost:1234/sse")
        .build()
        .expect("valid config")
}
