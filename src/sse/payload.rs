//! Classification of SSE `data` payloads.
//!
//! The backend is loose about payload shapes: depending on the route and
//! version it sends `{"content": ...}`, `{"message": ...}`, OpenAI-style
//! `choices[0].delta.content`, explicit `{"error": {...}}` objects, bare
//! keep-alive literals, or plain text. Classification inspects the shapes
//! in a fixed priority order and always produces a value - malformed data
//! degrades to plain text rather than an error, so the stream keeps
//! rendering something.

use serde_json::{Map, Value};

/// End-of-stream sentinel literal.
const DONE_SENTINEL: &str = "[DONE]";

/// The application-level interpretation of one SSE message's data.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    /// Terminal `[DONE]` sentinel; no further payloads follow.
    Done,
    /// Keep-alive with no content; consumers must not react to it.
    Heartbeat,
    /// Incremental chat text plus optional side-channel data.
    Message {
        content: String,
        metadata: Option<Value>,
    },
    /// Server-signaled error; ends the active stream attempt.
    Error { reason: String },
}

impl ParsedPayload {
    /// True for the two terminal variants.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParsedPayload::Done | ParsedPayload::Error { .. })
    }
}

/// Classify one SSE message's `data` string.
///
/// Checks, in order: the `[DONE]` sentinel, heartbeat literals, then a
/// JSON parse with ordered shape-sniffing (`error`, `content`, `message`,
/// `choices[0].delta.content`). Valid JSON that matches none of the known
/// shapes is passed through re-serialized rather than dropped. Never
/// panics and never returns a Rust error.
pub fn classify(data: &str) -> ParsedPayload {
    if data == DONE_SENTINEL {
        return ParsedPayload::Done;
    }
    if data == "ping" || data == "heartbeat" {
        return ParsedPayload::Heartbeat;
    }

    let value: Value = match serde_json::from_str(data) {
        Ok(value) => value,
        // Not JSON - surface the raw text as content.
        Err(_) => {
            return ParsedPayload::Message {
                content: data.to_string(),
                metadata: None,
            }
        }
    };

    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        let reason = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return ParsedPayload::Error { reason };
    }

    if let Some(content) = field_as_text(&value, "content") {
        return ParsedPayload::Message {
            content,
            metadata: value.get("metadata").cloned(),
        };
    }

    // Compatibility alias some backend versions use instead of `content`.
    if let Some(content) = field_as_text(&value, "message") {
        return ParsedPayload::Message {
            content,
            metadata: value.get("metadata").cloned(),
        };
    }

    if let Some(content) = delta_content(&value) {
        let mut metadata = Map::new();
        if let Some(model) = value.get("model") {
            metadata.insert("model".to_string(), model.clone());
        }
        if let Some(usage) = value.get("usage") {
            metadata.insert("usage".to_string(), usage.clone());
        }
        let metadata = if metadata.is_empty() {
            None
        } else {
            Some(Value::Object(metadata))
        };
        return ParsedPayload::Message {
            content: content.to_string(),
            metadata,
        };
    }

    // Last-resort passthrough: never drop valid JSON silently.
    ParsedPayload::Message {
        content: value.to_string(),
        metadata: Some(value),
    }
}

/// Extract a field as text if present and non-null.
///
/// Strings (including the empty string) are taken verbatim; a non-string
/// scalar is rendered through its JSON representation.
fn field_as_text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// OpenAI-style `choices[0].delta.content`.
fn delta_content(value: &Value) -> Option<&str> {
    value
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}
