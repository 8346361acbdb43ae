//! Append-only message log for one chat session.

use chrono::Utc;

use swasthya_core::types::{Message, MessageId, Origin};

/// Ordered messages of one chat session. Insertion order is display order.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return a copy of it.
    ///
    /// Ids are assigned from a per-conversation counter so they are unique and
    /// strictly increasing in creation order.
    pub fn push(&mut self, text: impl Into<String>, origin: Origin) -> Message {
        debug_assert!(
            origin == Origin::User || self.messages.iter().any(Message::is_user),
            "assistant message without a preceding user message"
        );
        self.next_id += 1;
        let message = Message {
            id: MessageId(self.next_id),
            text: text.into(),
            origin,
            created_at: Utc::now(),
        };
        self.messages.push(message.clone());
        message
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
