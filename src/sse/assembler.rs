//! Block-level SSE message assembly.
//!
//! Groups consecutive field lines into one logical message. The assembler
//! is stateful across calls: a block that has not yet reached its
//! blank-line terminator stays pending, so callers can feed lines as they
//! become available without re-scanning earlier input.

use super::line::{parse_line, SseField, SseLine};

/// One reconstructed server event.
///
/// `data` is the join of every `data:` line in the block with `\n` as the
/// separator. Immutable once emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SseMessage {
    /// Last `id:` value seen in the block, if any
    pub id: Option<String>,
    /// Last `event:` value seen in the block, if any
    pub event: Option<String>,
    /// Joined payload of all `data:` lines
    pub data: String,
    /// Reconnect delay in milliseconds, if the block carried one
    pub retry: Option<u64>,
}

/// Stateful assembler that accumulates field lines and emits complete
/// messages.
#[derive(Debug, Default)]
pub struct Assembler {
    id: Option<String>,
    event: Option<String>,
    retry: Option<u64>,
    /// Accumulated `data:` line values (SSE allows multiple per block)
    data_lines: Vec<String>,
}

impl Assembler {
    /// Create a new assembler with no pending block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line to the assembler.
    ///
    /// Returns a complete [`SseMessage`] when the line is the blank-line
    /// terminator of a block that buffered at least one `data:` line.
    /// Blank lines with no buffered data produce nothing (keep-alive
    /// framing is simply skipped), but still reset any partial field
    /// state so a stale `event:` cannot leak into the next block.
    pub fn push_line(&mut self, line: &str) -> Option<SseMessage> {
        match parse_line(line) {
            SseLine::Field(SseField::Id(id)) => {
                self.id = Some(id);
                None
            }
            SseLine::Field(SseField::Event(event)) => {
                self.event = Some(event);
                None
            }
            SseLine::Field(SseField::Data(data)) => {
                self.data_lines.push(data);
                None
            }
            SseLine::Field(SseField::Retry(ms)) => {
                self.retry = Some(ms);
                None
            }
            SseLine::Blank => self.take_message(),
            SseLine::Ignored => None,
        }
    }

    /// True if a partially assembled block is pending.
    pub fn has_pending(&self) -> bool {
        self.id.is_some()
            || self.event.is_some()
            || self.retry.is_some()
            || !self.data_lines.is_empty()
    }

    /// Clear all pending state.
    pub fn reset(&mut self) {
        self.id = None;
        self.event = None;
        self.retry = None;
        self.data_lines.clear();
    }

    fn take_message(&mut self) -> Option<SseMessage> {
        if self.data_lines.is_empty() {
            // Block carried no payload. Drop any id/event/retry so they
            // cannot attach to a later block.
            self.reset();
            return None;
        }

        let message = SseMessage {
            id: self.id.take(),
            event: self.event.take(),
            data: self.data_lines.join("\n"),
            retry: self.retry.take(),
        };
        self.data_lines.clear();
        Some(message)
    }
}
