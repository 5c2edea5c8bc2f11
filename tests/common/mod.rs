//! Shared helpers for integration tests.

use anima::models::ChatRequest;
use anima::transport::{ByteStream, ChatTransport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Transport that replays a fixed script of chunks.
pub struct ScriptTransport {
    script: Vec<Result<Vec<u8>, TransportError>>,
}

impl ScriptTransport {
    pub fn new(script: Vec<Result<Vec<u8>, TransportError>>) -> Self {
        Self { script }
    }

    pub fn ok(chunks: &[&[u8]]) -> Self {
        Self::new(chunks.iter().map(|c| Ok(c.to_vec())).collect())
    }
}

#[async_trait]
impl ChatTransport for ScriptTransport {
    async fn open_stream(&self, _request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let items: Vec<Result<Bytes, TransportError>> = self
            .script
            .iter()
            .map(|r| r.clone().map(Bytes::from))
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}

/// Transport fed chunk-by-chunk from a test, so the test controls timing
/// (e.g. cancelling between chunks). Single-use: the second `open_stream`
/// call fails.
pub struct ChannelTransport {
    rx: Mutex<Option<mpsc::UnboundedReceiver<Result<Bytes, TransportError>>>>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedSender<Result<Bytes, TransportError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl ChatTransport for ChannelTransport {
    async fn open_stream(&self, _request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let rx = self
            .rx
            .lock()
            .expect("lock poisoned")
            .take()
            .ok_or_else(|| TransportError::ConnectionFailed("stream already taken".to_string()))?;

        let chunks = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(chunks))
    }
}
