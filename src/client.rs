//! HTTP client for the Anima backend.
//!
//! Thin `reqwest` wrapper around the streaming chat endpoint. The client
//! implements [`ChatTransport`], so the conversation layer only ever sees
//! the transport trait and can be driven by a scripted stream in tests.

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use std::collections::VecDeque;
use std::pin::Pin;

use crate::config::ClientConfig;
use crate::error::AnimaError;
use crate::models::ChatRequest;
use crate::sse::{ParsedPayload, StreamProcessor};
use crate::transport::{ByteStream, ChatTransport, TransportError};

/// A pinned, boxed stream of classified payloads.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<ParsedPayload, TransportError>> + Send>>;

/// Client for the Anima backend API.
#[derive(Debug)]
pub struct AnimaClient {
    config: ClientConfig,
    client: Client,
}

impl AnimaClient {
    /// Create a client with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with a custom configuration.
    ///
    /// The configuration is taken as-is; use [`try_with_config`] to
    /// validate it first.
    ///
    /// [`try_with_config`]: AnimaClient::try_with_config
    pub fn with_config(config: ClientConfig) -> Self {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Create a client after validating the configuration.
    pub fn try_with_config(config: ClientConfig) -> Result<Self, AnimaError> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Build a client from environment configuration (`ANIMA_BASE_URL`).
    pub fn from_env() -> Result<Self, AnimaError> {
        Self::try_with_config(ClientConfig::from_env()?)
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check whether the backend is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool, TransportError> {
        let url = format!("{}/v1/health", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(response.status().is_success())
    }

    /// Open the chat stream and decode it into classified payloads.
    ///
    /// This is the library-level convenience surface; the conversation
    /// layer drives the byte stream itself via [`ChatTransport`].
    pub async fn stream_payloads(
        &self,
        request: &ChatRequest,
    ) -> Result<PayloadStream, TransportError> {
        let bytes = self.open_stream(request).await?;

        let payloads = stream::unfold(
            (bytes, StreamProcessor::new(), VecDeque::new()),
            |(mut bytes, mut processor, mut ready)| async move {
                loop {
                    if let Some(payload) = ready.pop_front() {
                        return Some((Ok(payload), (bytes, processor, ready)));
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            ready.extend(processor.process_chunk(&chunk));
                        }
                        Some(Err(e)) => {
                            return Some((Err(e), (bytes, processor, ready)));
                        }
                        // Stream ended; an unterminated trailing block is
                        // discarded rather than guessed at.
                        None => return None,
                    }
                }
            },
        );

        Ok(Box::pin(payloads))
    }
}

impl Default for AnimaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for AnimaClient {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream, TransportError> {
        let url = format!("{}/v1/chat/stream", self.config.base_url);
        tracing::debug!(%url, session_id = %request.session_id, "opening chat stream");

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            tracing::warn!(status = status.as_u16(), "chat stream request rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes_stream()
            .map_err(|e| TransportError::Stream(e.to_string()));
        Ok(Box::pin(bytes))
    }
}
