//! Chunk-to-payload stream processing.
//!
//! The processor is the stateful decoder for one logical connection: it
//! accepts raw byte chunks in arrival order, reassembles SSE messages
//! across arbitrary chunk boundaries, and emits classified payloads in
//! source order. It holds only the partial trailing line plus assembler
//! state between calls, so memory stays bounded regardless of stream
//! length.
//!
//! Calls are strictly sequential; the processor is not a synchronization
//! point and must not be shared between concurrent readers.

use super::assembler::Assembler;
use super::payload::{classify, ParsedPayload};
use super::utf8::Utf8Decoder;

/// Stateful decoder from network chunks to classified payloads.
///
/// Created per outgoing chat request and discarded (or [`reset`]) when
/// the request completes, errors, or is cancelled. Any partially buffered
/// message is dropped at that point; no completion is guessed.
///
/// [`reset`]: StreamProcessor::reset
#[derive(Debug, Default)]
pub struct StreamProcessor {
    decoder: Utf8Decoder,
    /// Text after the last newline seen - at most one partial line.
    pending: String,
    assembler: Assembler,
    /// Latest server-advertised reconnection delay, in milliseconds.
    retry_hint: Option<u64>,
}

impl StreamProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one inbound chunk, returning every payload completed by it.
    ///
    /// Payload order matches server emission order within and across
    /// chunks. Splitting the same byte stream differently across calls
    /// yields the same concatenated payload sequence.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Vec<ParsedPayload> {
        let text = self.decoder.decode(chunk);
        self.pending.push_str(&text);

        let mut payloads = Vec::new();
        while let Some(newline) = self.pending.find('\n') {
            // Consume the line and its newline; tolerate CRLF framing.
            let mut line: String = self.pending.drain(..=newline).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }

            if let Some(message) = self.assembler.push_line(&line) {
                if message.retry.is_some() {
                    self.retry_hint = message.retry;
                }
                tracing::trace!(
                    event = message.event.as_deref().unwrap_or(""),
                    bytes = message.data.len(),
                    "sse message assembled"
                );
                payloads.push(classify(&message.data));
            }
        }

        payloads
    }

    /// Bytes of text retained for the next call (partial trailing line).
    pub fn pending_len(&self) -> usize {
        self.pending.len() + self.decoder.carry_len()
    }

    /// Most recent `retry` value seen on this stream, in milliseconds.
    ///
    /// The stream layers never reconnect on their own; callers with
    /// their own reconnect policy can honor this delay.
    pub fn retry_hint(&self) -> Option<u64> {
        self.retry_hint
    }

    /// Clear buffer, decoder carry, and assembler state for reuse on an
    /// independent stream.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.pending.clear();
        self.assembler.reset();
        self.retry_hint = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(payloads: &[ParsedPayload]) -> Vec<String> {
        payloads
            .iter()
            .map(|p| match p {
                ParsedPayload::Message { content, .. } => content.clone(),
                other => panic!("expected message payload, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_single_message() {
        let mut processor = StreamProcessor::new();
        let payloads = processor.process_chunk(b"data: hello\n\n");
        assert_eq!(
            payloads,
            vec![ParsedPayload::Message {
                content: "hello".to_string(),
                metadata: None,
            }]
        );
    }

    #[test]
    fn test_done_sentinel() {
        let mut processor = StreamProcessor::new();
        let payloads = processor.process_chunk(b"data: [DONE]\n\n");
        assert_eq!(payloads, vec![ParsedPayload::Done]);
    }

    #[test]
    fn test_message_split_mid_field_name() {
        let mut processor = StreamProcessor::new();
        assert!(processor.process_chunk(b"dat").is_empty());
        let payloads = processor.process_chunk(b"a: hi\n\n");
        assert_eq!(contents(&payloads), vec!["hi"]);
    }

    #[test]
    fn test_no_loss_at_any_split_point() {
        let input = b"id: 3\ndata: hello world\n\n";
        for split in 0..=input.len() {
            let mut processor = StreamProcessor::new();
            let mut payloads = processor.process_chunk(&input[..split]);
            payloads.extend(processor.process_chunk(&input[split..]));
            assert_eq!(contents(&payloads), vec!["hello world"], "split at {split}");
        }
    }

    #[test]
    fn test_chunk_boundary_independence() {
        let input: &[u8] =
            b"data: {\"content\":\"a\"}\n\nping\n\ndata: ping\n\ndata: {\"content\":\"b\"}\n\ndata: [DONE]\n\n";

        let mut whole = StreamProcessor::new();
        let expected = whole.process_chunk(input);

        let mut split = StreamProcessor::new();
        let mut collected = Vec::new();
        for chunk in input.chunks(7) {
            collected.extend(split.process_chunk(chunk));
        }
        assert_eq!(collected, expected);
    }

    #[test]
    fn test_multiple_messages_in_one_chunk_preserve_order() {
        let mut processor = StreamProcessor::new();
        let payloads =
            processor.process_chunk(b"data: {\"content\":\"one\"}\n\ndata: {\"content\":\"two\"}\n\n");
        assert_eq!(contents(&payloads), vec!["one", "two"]);
    }

    #[test]
    fn test_multi_data_line_block() {
        let mut processor = StreamProcessor::new();
        let payloads = processor.process_chunk(b"data: foo\ndata: bar\n\n");
        assert_eq!(contents(&payloads), vec!["foo\nbar"]);
    }

    #[test]
    fn test_error_payload() {
        let mut processor = StreamProcessor::new();
        let payloads = processor.process_chunk(b"data: {\"error\":{\"message\":\"boom\"}}\n\n");
        assert_eq!(
            payloads,
            vec![ParsedPayload::Error {
                reason: "boom".to_string()
            }]
        );
    }

    #[test]
    fn test_crlf_framing() {
        let mut processor = StreamProcessor::new();
        let payloads = processor.process_chunk(b"data: hi\r\n\r\n");
        assert_eq!(contents(&payloads), vec!["hi"]);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        // "你好" = E4 BD A0 E5 A5 BD, split inside the first character.
        let mut processor = StreamProcessor::new();
        assert!(processor.process_chunk(b"data: \xE4\xBD").is_empty());
        let payloads = processor.process_chunk(b"\xA0\xE5\xA5\xBD\n\n");
        assert_eq!(contents(&payloads), vec!["你好"]);
    }

    #[test]
    fn test_buffer_bounded_to_partial_line() {
        let mut processor = StreamProcessor::new();
        processor.process_chunk(b"data: consumed line\ndata: tail");
        // Only the text after the last newline is retained.
        assert_eq!(processor.pending_len(), "data: tail".len());

        processor.process_chunk(b"\n\n");
        assert_eq!(processor.pending_len(), 0);
    }

    #[test]
    fn test_retry_hint_tracks_latest_value() {
        let mut processor = StreamProcessor::new();
        assert_eq!(processor.retry_hint(), None);

        let payloads = processor.process_chunk(b"retry: 3000\ndata: hi\n\n");
        assert_eq!(contents(&payloads), vec!["hi"]);
        assert_eq!(processor.retry_hint(), Some(3000));

        // Messages without a retry field keep the last advertised delay.
        processor.process_chunk(b"data: more\n\n");
        assert_eq!(processor.retry_hint(), Some(3000));

        processor.reset();
        assert_eq!(processor.retry_hint(), None);
    }

    #[test]
    fn test_heartbeat_comment_lines_produce_nothing() {
        let mut processor = StreamProcessor::new();
        assert!(processor.process_chunk(b": keep-alive\n\n").is_empty());
    }

    #[test]
    fn test_reset_discards_partial_message() {
        let mut processor = StreamProcessor::new();
        processor.process_chunk(b"data: half");
        processor.reset();
        assert_eq!(processor.pending_len(), 0);
        // A fresh stream after reset starts clean.
        let payloads = processor.process_chunk(b"data: whole\n\n");
        assert_eq!(contents(&payloads), vec!["whole"]);
    }

    #[test]
    fn test_interleaved_heartbeats_and_content() {
        let mut processor = StreamProcessor::new();
        let payloads = processor
            .process_chunk(b"data: ping\n\ndata: {\"content\":\"x\"}\n\ndata: heartbeat\n\n");
        assert_eq!(
            payloads,
            vec![
                ParsedPayload::Heartbeat,
                ParsedPayload::Message {
                    content: "x".to_string(),
                    metadata: None,
                },
                ParsedPayload::Heartbeat,
            ]
        );
    }
}
