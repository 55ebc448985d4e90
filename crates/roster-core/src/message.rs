//! Chat messages delivered as custom channel events.

use serde::{Deserialize, Serialize};

/// A chat message posted to the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Identity that posted the message.
    #[serde(rename = "user_id")]
    pub sender: String,

    /// Message text.
    pub body: String,
}

/// Append-only log of received messages, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(message);
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no message was received.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    /// Messages in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }

    /// Messages as a slice.
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.entries
    }
}
