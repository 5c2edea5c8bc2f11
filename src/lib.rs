//! Anima - streaming chat client for an AI digital-human backend.
//!
//! The backend streams assistant replies as Server-Sent Events over a
//! chunked HTTP response. This crate reconstructs those streams
//! incrementally (arbitrary chunk boundaries, multi-byte characters split
//! across chunks, loose payload shapes) and drives a per-turn
//! conversation state machine with explicit cancellation.

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod models;
pub mod sse;
pub mod transport;

pub use client::AnimaClient;
pub use conversation::{Conversation, TurnState};
pub use error::AnimaError;
pub use sse::{ParsedPayload, StreamProcessor};
pub use transport::{CancelToken, ChatTransport};
