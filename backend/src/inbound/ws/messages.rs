//! Wire payloads for the chat WebSocket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ChatMessage;

/// Inbound frame: a client posts one message to the room.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    /// Raw message text; validated server-side.
    pub body: String,
}

/// Outbound frame: one message fanned out to the room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageEvent {
    /// Message identifier.
    pub id: Uuid,
    /// Course room.
    pub course_id: String,
    /// Author.
    pub sender_id: String,
    /// Message text.
    pub body: String,
    /// Server-side receipt timestamp.
    pub sent_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatMessageEvent {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            course_id: message.course_id.to_string(),
            sender_id: message.sender_id.to_string(),
            body: message.body.into(),
            sent_at: message.sent_at,
        }
    }
}

/// Outbound frame: a rejected message, connection stays open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatErrorEvent {
    /// Why the message was rejected.
    pub error: String,
}
