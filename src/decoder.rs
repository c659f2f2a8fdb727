//! Frame payload decoding.
//!
//! Each [`SseFrame`] carries a JSON object. The decoder lifts the fields the client
//! understands into typed [`StreamEvent`] fields and keeps the whole object in
//! [`StreamEvent::raw`]:
//!
//! | payload field | event field  |
//! |---------------|--------------|
//! | `think`       | `think`      |
//! | `text`        | `text`       |
//! | `tool_calls`  | `tool_call`  |
//!
//! Missing or oddly typed `think`/`text` fields are simply left unset. Two things are
//! errors: a payload that is not a JSON object, and a `tool_calls` object whose `function`
//! (with string `name` and `arguments`) is missing. A broken tool call cannot be replayed
//! to the model later, so it is reported rather than guessed at.

use crate::sse::SseFrame;
use crate::types::{FunctionCall, StreamEvent, ToolCall};
use crate::{Error, Result};
use serde_json::{Map, Value};

/// Decodes one frame. Failures come back as an event with `error` set, never as a panic.
pub fn decode_event(frame: &SseFrame) -> StreamEvent {
    match try_decode(&frame.event, &frame.data) {
        Ok(event) => event,
        Err(error) => StreamEvent {
            event: frame.event.clone(),
            error: Some(error),
            ..StreamEvent::default()
        },
    }
}

fn try_decode(event: &str, data: &str) -> Result<StreamEvent> {
    let payload: Value = serde_json::from_str(data)?;
    let Value::Object(raw) = payload else {
        return Err(Error::decode(format!(
            "{} payload is not a JSON object",
            event
        )));
    };

    let think = raw.get("think").and_then(Value::as_str).map(str::to_string);
    let text = raw.get("text").and_then(Value::as_str).map(str::to_string);

    let tool_call = match raw.get("tool_calls") {
        Some(Value::Object(tool_calls)) => Some(decode_tool_call(tool_calls)?),
        Some(other) => {
            log::warn!("Ignoring non-object tool_calls field: {}", other);
            None
        }
        None => None,
    };

    Ok(StreamEvent {
        event: event.to_string(),
        think,
        text,
        tool_call,
        raw,
        error: None,
    })
}

fn decode_tool_call(tool_calls: &Map<String, Value>) -> Result<ToolCall> {
    let id = tool_calls
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);
    let kind = tool_calls
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let index = tool_calls
        .get("index")
        .and_then(Value::as_f64)
        .map(|n| n as u32)
        .unwrap_or_default();

    let function = tool_calls
        .get("function")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::decode("tool_calls.function is missing"))?;
    let name = required_str(function, "name")?;
    let arguments = required_str(function, "arguments")?;

    Ok(ToolCall {
        id,
        kind,
        index,
        function: FunctionCall { name, arguments },
    })
}

fn required_str(function: &Map<String, Value>, field: &str) -> Result<String> {
    function
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::decode(format!("tool_calls.function.{} is missing", field)))
}
