//! Transport abstraction for the streaming chat endpoint.
//!
//! The conversation layer never talks to the network directly: it is
//! handed an object that can open a byte-chunk stream for a request, plus
//! an explicit cancellation token. This keeps the whole pipeline testable
//! with scripted streams instead of a real backend.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::ChatRequest;

/// A pinned, boxed stream of raw response-body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Transport-level errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Could not reach the backend at all
    ConnectionFailed(String),
    /// Backend answered with a non-success HTTP status
    Status { status: u16, message: String },
    /// The response body stream broke mid-flight
    Stream(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Status { status, message } => {
                write!(f, "server error ({}): {}", status, message)
            }
            TransportError::Stream(msg) => write!(f, "stream error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// Source of response-body chunks for one chat turn.
///
/// Implementations must deliver chunks in arrival order. Dropping the
/// returned stream releases the underlying reader.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open the streaming response for `request`.
    ///
    /// Resolves once response headers have arrived. A non-success status
    /// is an `Err` here, not an item on the stream.
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError>;
}

/// Cooperative cancellation handle for one chat turn.
///
/// Cloneable; cancelling any clone is observed by all. The conversation
/// loop checks the token before every chunk read and also races pending
/// reads against [`cancelled`], so an abort takes effect without waiting
/// for the next chunk to arrive.
///
/// [`cancelled`]: CancelToken::cancelled
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the token has been cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives inside self, so wait_for cannot fail while
        // we hold a clone of the token.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
