use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Message;

/// Events published by a chat session.
///
/// Consumed by the presentation shell to re-render when a deferred
/// assistant reply lands.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChatEvent {
    /// A message was appended to the conversation.
    MessageAppended { session_id: Uuid, message: Message },

    /// The session was closed; `cancelled_replies` replies will never land.
    SessionClosed {
        session_id: Uuid,
        cancelled_replies: usize,
    },
}

impl ChatEvent {
    /// The session this event belongs to.
    pub fn session_id(&self) -> Uuid {
        match self {
            ChatEvent::MessageAppended { session_id, .. } => *session_id,
            ChatEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }
}
