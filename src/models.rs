//! Data models shared between the client and the conversation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message; grows incrementally while streaming
    pub content: String,
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// Whether the message is still receiving streamed content
    #[serde(default)]
    pub is_streaming: bool,
}

impl ChatMessage {
    /// Create a finished user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
            is_streaming: false,
        }
    }

    /// Create an assistant message that will be filled in by the stream.
    pub fn assistant_streaming() -> Self {
        Self {
            role: MessageRole::Assistant,
            content: String::new(),
            created_at: Utc::now(),
            is_streaming: true,
        }
    }

    /// Create a finished assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
            is_streaming: false,
        }
    }

    /// Append a streamed delta to the content.
    pub fn append_delta(&mut self, delta: &str) {
        self.content.push_str(delta);
    }

    /// Mark the message as no longer streaming.
    pub fn finalize(&mut self) {
        self.is_streaming = false;
    }
}

/// Request body for the streaming chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The user's message
    pub prompt: String,
    /// Client-generated id for this streaming session
    pub session_id: String,
    /// Conversation to continue; `None` starts a new one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// Create a request that starts a new conversation.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            session_id: Uuid::new_v4().to_string(),
            conversation_id: None,
        }
    }

    /// Create a request that continues an existing conversation.
    pub fn with_conversation(prompt: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            session_id: Uuid::new_v4().to_string(),
            conversation_id: Some(conversation_id.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_delta_extends_content() {
        let mut message = ChatMessage::assistant_streaming();
        message.append_delta("Hello, ");
        message.append_delta("world");
        assert_eq!(message.content, "Hello, world");
        assert!(message.is_streaming);
    }

    #[test]
    fn test_finalize_clears_streaming_flag() {
        let mut message = ChatMessage::assistant_streaming();
        message.append_delta("done");
        message.finalize();
        assert!(!message.is_streaming);
        assert_eq!(message.content, "done");
    }

    #[test]
    fn test_user_message_is_not_streaming() {
        let message = ChatMessage::user("hi");
        assert_eq!(message.role, MessageRole::User);
        assert!(!message.is_streaming);
    }

    #[test]
    fn test_chat_request_serialization_skips_absent_conversation() {
        let request = ChatRequest::new("hello");
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("conversation_id").is_none());
        assert_eq!(json["prompt"], "hello");
    }

    #[test]
    fn test_chat_request_with_conversation() {
        let request = ChatRequest::with_conversation("hello", "conv-1");
        assert_eq!(request.conversation_id.as_deref(), Some("conv-1"));
        // Fresh session id per request
        let other = ChatRequest::with_conversation("hello", "conv-1");
        assert_ne!(request.session_id, other.session_id);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            r#""assistant""#
        );
    }
}
