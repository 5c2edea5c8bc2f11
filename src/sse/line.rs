//! Line-level SSE parsing.
//!
//! The SSE wire format is line oriented: `field: value`, with blocks of
//! field lines separated by a blank line. This module classifies one raw
//! line (without its trailing newline) into a typed field or a framing
//! signal. It never errors: malformed lines are dropped so that newer
//! backend revisions can add fields without breaking older clients.

/// A single recognized SSE field.
#[derive(Debug, Clone, PartialEq)]
pub enum SseField {
    /// Event id (`id: <value>`)
    Id(String),
    /// Event type (`event: <value>`)
    Event(String),
    /// Data payload line (`data: <value>`); may repeat within one block
    Data(String),
    /// Reconnect delay in milliseconds (`retry: <ms>`)
    Retry(u64),
}

/// Classification of one raw SSE line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Blank line - terminates the current event block
    Blank,
    /// Comment (starts with `:`), unknown field, or malformed value
    Ignored,
    /// A recognized field line
    Field(SseField),
}

/// Parse a single SSE line into its component type.
///
/// The field name is everything before the first `:`; the value is the
/// remainder with at most one leading space removed. Comment lines
/// (leading `:`), unknown field names, and `retry` values that fail
/// integer parsing are all reported as [`SseLine::Ignored`].
pub fn parse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Blank;
    }

    if line.starts_with(':') {
        return SseLine::Ignored;
    }

    let (name, value) = match line.split_once(':') {
        Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
        // A line with no colon is a field name with an empty value.
        None => (line, ""),
    };

    match name {
        "id" => SseLine::Field(SseField::Id(value.to_string())),
        "event" => SseLine::Field(SseField::Event(value.to_string())),
        "data" => SseLine::Field(SseField::Data(value.to_string())),
        "retry" => match value.parse::<u64>() {
            Ok(ms) => SseLine::Field(SseField::Retry(ms)),
            Err(_) => SseLine::Ignored,
        },
        _ => SseLine::Ignored,
    }
}
