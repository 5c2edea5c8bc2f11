//! Conversation state and the per-turn streaming loop.
//!
//! One [`Conversation`] owns a transcript and drives one turn at a time:
//! the user's message is appended optimistically, the transport's byte
//! stream is decoded through a fresh [`StreamProcessor`], and the
//! assistant's reply grows in place inside a single transcript entry.
//! Each turn gets its own processor and accumulator, so a cancelled
//! turn can never leak content into the next one.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatRequest};
use crate::sse::{ParsedPayload, StreamProcessor};
use crate::transport::{CancelToken, ChatTransport};

/// Fallback reply shown when a turn ends in error with no content.
const ERROR_FALLBACK: &str = "Sorry, something went wrong. Please try again.";

/// State of the current (or most recent) turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// No turn has started yet
    Idle,
    /// Request issued, response headers not yet received
    Sending,
    /// Byte stream attached, reply in progress
    Streaming,
    /// Stream finished normally (`[DONE]` or end of stream)
    Completed,
    /// Server error, transport failure, or broken stream
    Errored,
    /// Deliberately aborted; not an error, no user-visible message
    Cancelled,
}

/// A chat conversation with streaming assistant replies.
///
/// Turns are strictly sequential: [`send`] borrows the conversation
/// mutably for the whole turn, so at most one stream is ever active.
/// Cancellation happens through the [`CancelToken`] handed to
/// [`send_with_token`]; cancel a clone of it from another task to abort
/// the in-flight turn before starting the next one.
///
/// [`send`]: Conversation::send
/// [`send_with_token`]: Conversation::send_with_token
pub struct Conversation {
    id: String,
    transcript: Vec<ChatMessage>,
    state: TurnState,
    composing: bool,
    last_error: Option<String>,
    heartbeats: u64,
    /// Streams assistant deltas to an observer (e.g. a UI) as they land.
    delta_tx: Option<mpsc::UnboundedSender<String>>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            transcript: Vec::new(),
            state: TurnState::Idle,
            composing: false,
            last_error: None,
            heartbeats: 0,
            delta_tx: None,
        }
    }

    /// Attach a channel that receives each assistant delta as it arrives.
    pub fn with_delta_channel(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.delta_tx = Some(tx);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// True while the assistant is composing a reply.
    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Heartbeats observed on the current stream (diagnostic only).
    pub fn heartbeat_count(&self) -> u64 {
        self.heartbeats
    }

    /// Send a message and stream the reply to completion.
    pub async fn send<T>(&mut self, transport: &T, prompt: &str) -> TurnState
    where
        T: ChatTransport + ?Sized,
    {
        self.send_with_token(transport, prompt, CancelToken::new())
            .await
    }

    /// Send a message with an externally held cancellation token.
    ///
    /// The token is checked before every chunk read and pending reads are
    /// raced against it, so cancelling aborts promptly. Returns the
    /// terminal state of the turn; an empty prompt is a no-op.
    pub async fn send_with_token<T>(
        &mut self,
        transport: &T,
        prompt: &str,
        token: CancelToken,
    ) -> TurnState
    where
        T: ChatTransport + ?Sized,
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return self.state;
        }

        // Optimistic append; never rolled back.
        self.transcript.push(ChatMessage::user(prompt));
        self.state = TurnState::Sending;
        self.composing = true;
        self.last_error = None;
        self.heartbeats = 0;

        let request = ChatRequest::with_conversation(prompt, self.id.clone());
        let (turn, reply_at) = self.run_turn(transport, &request, &token).await;
        self.finish_turn(turn, reply_at);
        self.state
    }

    /// Reset to a fresh conversation, keeping the id.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.state = TurnState::Idle;
        self.composing = false;
        self.last_error = None;
        self.heartbeats = 0;
    }

    /// Drive one turn's stream to a terminal outcome.
    ///
    /// Also returns the transcript index of this turn's assistant entry,
    /// if any delta (even an empty one) created it.
    async fn run_turn<T>(
        &mut self,
        transport: &T,
        request: &ChatRequest,
        token: &CancelToken,
    ) -> (TurnOutcome, Option<usize>)
    where
        T: ChatTransport + ?Sized,
    {
        // Index of this turn's assistant entry, created on first content.
        let mut reply_at: Option<usize> = None;

        if token.is_cancelled() {
            return (TurnOutcome::Cancelled, reply_at);
        }

        let mut stream = tokio::select! {
            biased;
            _ = token.cancelled() => return (TurnOutcome::Cancelled, reply_at),
            opened = transport.open_stream(request) => match opened {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "chat stream failed to open");
                    return (TurnOutcome::Errored(e.to_string()), reply_at);
                }
            },
        };

        self.state = TurnState::Streaming;
        // Fresh per turn: no state is reused across turns.
        let mut processor = StreamProcessor::new();

        loop {
            if token.is_cancelled() {
                return (TurnOutcome::Cancelled, reply_at);
            }

            let next = tokio::select! {
                // Cancellation wins over a simultaneously ready chunk, so
                // nothing arriving after an abort mutates state.
                biased;
                _ = token.cancelled() => return (TurnOutcome::Cancelled, reply_at),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    for payload in processor.process_chunk(&chunk) {
                        match payload {
                            ParsedPayload::Message { content, metadata } => {
                                if metadata.is_some() {
                                    tracing::trace!(?metadata, "payload metadata ignored");
                                }
                                self.apply_delta(&mut reply_at, &content);
                            }
                            ParsedPayload::Heartbeat => {
                                self.heartbeats += 1;
                                tracing::trace!(count = self.heartbeats, "heartbeat");
                            }
                            ParsedPayload::Done => return (TurnOutcome::Completed, reply_at),
                            ParsedPayload::Error { reason } => {
                                return (TurnOutcome::Errored(reason), reply_at);
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "chat stream broke mid-turn");
                    return (TurnOutcome::Errored(e.to_string()), reply_at);
                }
                // Server closed without a `[DONE]`; treat the reply so
                // far as complete rather than discarding it.
                None => return (TurnOutcome::Completed, reply_at),
            }
        }
    }

    /// Extend this turn's assistant entry, creating it on first content.
    fn apply_delta(&mut self, reply_at: &mut Option<usize>, delta: &str) {
        let index = *reply_at.get_or_insert_with(|| {
            self.transcript.push(ChatMessage::assistant_streaming());
            self.transcript.len() - 1
        });
        self.transcript[index].append_delta(delta);
        if let Some(tx) = &self.delta_tx {
            let _ = tx.send(delta.to_string());
        }
    }

    /// Apply the terminal transition: freeze the reply, clear composing,
    /// and surface errors as a fallback assistant message.
    fn finish_turn(&mut self, outcome: TurnOutcome, reply_at: Option<usize>) {
        if let Some(last) = self.transcript.last_mut() {
            last.finalize();
        }
        self.composing = false;

        match outcome {
            TurnOutcome::Completed => {
                self.state = TurnState::Completed;
            }
            TurnOutcome::Cancelled => {
                // Deliberate abort: no user-visible message.
                self.state = TurnState::Cancelled;
            }
            TurnOutcome::Errored(reason) => {
                self.state = TurnState::Errored;
                tracing::warn!(%reason, "turn ended in error");
                // Never leave the turn with no response. An existing reply
                // entry is this turn's single slot even if only empty
                // deltas landed in it; the fallback fills it in place.
                match reply_at {
                    Some(index) if !self.transcript[index].content.is_empty() => {}
                    Some(index) => {
                        self.transcript[index].content = ERROR_FALLBACK.to_string();
                    }
                    None => self.transcript.push(ChatMessage::assistant(ERROR_FALLBACK)),
                }
                self.last_error = Some(reason);
            }
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
enum TurnOutcome {
    Completed,
    Errored(String),
    Cancelled,
}
