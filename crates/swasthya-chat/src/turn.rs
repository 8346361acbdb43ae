//! Turn manager: owns one chat session's conversation and pending input.
//!
//! A user submission is appended immediately; the assistant reply is picked
//! from the catalog and appended after a fixed delay through the injected
//! scheduler. Closing or dropping the manager cancels replies still pending.
//!
//! Replies append and publish while holding the conversation lock, and
//! teardown marks the session closed under the same lock. A reply that
//! already started when the session closed either lands before
//! `SessionClosed` or not at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use swasthya_core::events::ChatEvent;
use swasthya_core::types::{Message, MessageId, Origin};

use crate::catalog::ResponseCatalog;
use crate::conversation::Conversation;
use crate::picker::IndexSource;
use crate::scheduler::{ReplyHandle, ReplyScheduler};

/// Delay before the assistant reply lands when none is configured.
pub const DEFAULT_REPLY_DELAY: Duration = Duration::from_millis(1500);

/// Coordinates user turns and deferred assistant replies for one session.
pub struct TurnManager {
    session_id: Uuid,
    conversation: Arc<Mutex<Conversation>>,
    closed: Arc<AtomicBool>,
    catalog: Arc<ResponseCatalog>,
    picker: Arc<dyn IndexSource>,
    scheduler: Arc<dyn ReplyScheduler>,
    reply_delay: Duration,
    pending_input: String,
    pending_replies: Vec<ReplyHandle>,
    events: Option<UnboundedSender<ChatEvent>>,
}

impl std::fmt::Debug for TurnManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnManager")
            .field("session_id", &self.session_id)
            .field("reply_delay", &self.reply_delay)
            .field("pending_input", &self.pending_input)
            .field("pending_replies", &self.pending_replies.len())
            .field("has_events", &self.events.is_some())
            .finish()
    }
}

impl TurnManager {
    /// Open a new session with an empty conversation.
    pub fn new(
        catalog: Arc<ResponseCatalog>,
        picker: Arc<dyn IndexSource>,
        scheduler: Arc<dyn ReplyScheduler>,
    ) -> Self {
        let session_id = Uuid::new_v4();
        tracing::info!(session_id = %session_id, "Chat session opened");
        Self {
            session_id,
            conversation: Arc::new(Mutex::new(Conversation::new())),
            closed: Arc::new(AtomicBool::new(false)),
            catalog,
            picker,
            scheduler,
            reply_delay: DEFAULT_REPLY_DELAY,
            pending_input: String::new(),
            pending_replies: Vec::new(),
            events: None,
        }
    }

    /// Set the simulated "thinking" delay.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    /// Publish every appended message on `events`.
    pub fn with_events(mut self, events: UnboundedSender<ChatEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn reply_delay(&self) -> Duration {
        self.reply_delay
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Replace the input buffer, e.g. with a dictated transcript.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Submit whatever is in the input buffer.
    pub fn submit_pending(&mut self) -> Option<Message> {
        let text = self.pending_input.clone();
        self.submit_user_text(&text)
    }

    /// Append the trimmed user text and schedule one assistant reply.
    ///
    /// Blank text is ignored: nothing is appended and the input buffer is
    /// left untouched.
    pub fn submit_user_text(&mut self, text: &str) -> Option<Message> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            tracing::debug!(session_id = %self.session_id, "Ignoring blank submission");
            return None;
        }

        let message = lock(&self.conversation).push(trimmed, Origin::User);
        self.pending_input.clear();
        tracing::debug!(
            session_id = %self.session_id,
            message_id = %message.id,
            text_len = trimmed.len(),
            "User message appended"
        );
        publish(&self.events, self.session_id, &message);

        self.schedule_reply(trimmed.to_string());
        Some(message)
    }

    fn schedule_reply(&mut self, user_text: String) {
        let session_id = self.session_id;
        let conversation = Arc::clone(&self.conversation);
        let closed = Arc::clone(&self.closed);
        let catalog = Arc::clone(&self.catalog);
        let picker = Arc::clone(&self.picker);
        let events = self.events.clone();

        let handle = self.scheduler.schedule(
            self.reply_delay,
            Box::new(move || {
                let mut conversation = lock(&conversation);
                if closed.load(Ordering::SeqCst) {
                    tracing::debug!(session_id = %session_id, "Dropping reply for closed session");
                    return;
                }
                let reply = catalog.select(&user_text, picker.as_ref()).to_string();
                let message = conversation.push(reply, Origin::Assistant);
                tracing::debug!(
                    session_id = %session_id,
                    message_id = %message.id,
                    "Assistant reply appended"
                );
                publish(&events, session_id, &message);
            }),
        );

        self.pending_replies.retain(|h| h.is_pending() || h.is_running());
        self.pending_replies.push(handle);
        tracing::trace!(
            session_id = %self.session_id,
            delay_ms = self.reply_delay.as_millis() as u64,
            pending = self.pending_replies.len(),
            "Assistant reply scheduled"
        );
    }

    /// Snapshot of the conversation in display order.
    pub fn conversation(&self) -> Vec<Message> {
        lock(&self.conversation).messages().to_vec()
    }

    /// Look up one message by id.
    pub fn message(&self, id: MessageId) -> Option<Message> {
        lock(&self.conversation).get(id).cloned()
    }

    /// Number of replies scheduled but not yet delivered.
    pub fn pending_replies(&self) -> usize {
        self.pending_replies
            .iter()
            .filter(|h| h.is_pending() || h.is_running())
            .count()
    }

    /// End the session. Replies still pending are cancelled and never land.
    /// Returns how many were cancelled.
    pub fn close(mut self) -> usize {
        let cancelled = self.shut_down();
        tracing::info!(
            session_id = %self.session_id,
            cancelled_replies = cancelled,
            "Chat session closed"
        );
        if let Some(events) = &self.events {
            let _ = events.send(ChatEvent::SessionClosed {
                session_id: self.session_id,
                cancelled_replies: cancelled,
            });
        }
        cancelled
    }

    fn shut_down(&mut self) -> usize {
        let _conversation = lock(&self.conversation);
        self.closed.store(true, Ordering::SeqCst);
        self.pending_replies
            .drain(..)
            .filter(|handle| handle.cancel())
            .count()
    }
}

impl Drop for TurnManager {
    fn drop(&mut self) {
        let cancelled = self.shut_down();
        if cancelled > 0 {
            tracing::debug!(
                session_id = %self.session_id,
                cancelled_replies = cancelled,
                "Pending replies cancelled on drop"
            );
        }
    }
}

fn lock(conversation: &Mutex<Conversation>) -> MutexGuard<'_, Conversation> {
    conversation.lock().unwrap_or_else(|e| e.into_inner())
}

fn publish(events: &Option<UnboundedSender<ChatEvent>>, session_id: Uuid, message: &Message) {
    if let Some(events) = events {
        // The receiver may already be gone during shutdown.
        let _ = events.send(ChatEvent::MessageAppended {
            session_id,
            message: message.clone(),
        });
    }
}
