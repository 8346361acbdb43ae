//! Speech bridge: dictation lifecycle and playback over an injected host.
//!
//! The bridge owns at most one recognition session. Host events arrive on a
//! channel (see [`SpeechBridge::take_events`]) and are fed back through
//! [`SpeechBridge::handle_event`], which ignores events from sessions the
//! bridge has already released.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use swasthya_core::config::SpeechConfig;

use crate::host::{
    RecognitionEvent, RecognitionEventKind, RecognitionRequest, RecognitionSession,
    RecognitionSink, SessionTicket, SpeechHost, Utterance,
};
use crate::notice::{Notice, NoticeSink};
use crate::state::{DictationState, StateMachine};

/// Locales the bridge asks the host for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSettings {
    pub dictation_locale: String,
    pub playback_locale: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self::from(&SpeechConfig::default())
    }
}

impl From<&SpeechConfig> for SpeechSettings {
    fn from(config: &SpeechConfig) -> Self {
        Self {
            dictation_locale: config.dictation_locale.clone(),
            playback_locale: config.playback_locale.clone(),
        }
    }
}

/// Result of asking the bridge to start dictation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Listening(SessionTicket),
    AlreadyListening,
    /// The host has no speech-to-text; a notice was raised.
    Unsupported,
    /// The host has speech-to-text but could not open a session.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started(StartOutcome),
    Stopped,
}

/// What a host event meant for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationUpdate {
    /// Stale or irrelevant event.
    Ignored,
    Started,
    /// Listening ended with this transcript; it belongs in the input buffer.
    Transcript(String),
    /// Listening ended without a transcript.
    Finished,
    /// Listening ended because recognition failed.
    Failed(String),
}

struct ActiveRecognition {
    ticket: SessionTicket,
    session: Box<dyn RecognitionSession>,
}

/// Dictation toggle and playback over a [`SpeechHost`].
pub struct SpeechBridge {
    host: Arc<dyn SpeechHost>,
    notices: Arc<dyn NoticeSink>,
    settings: SpeechSettings,
    state: StateMachine,
    active: Option<ActiveRecognition>,
    next_ticket: u64,
    last_error: Option<String>,
    events_tx: UnboundedSender<RecognitionEvent>,
    events_rx: Option<UnboundedReceiver<RecognitionEvent>>,
}

impl std::fmt::Debug for SpeechBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechBridge")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("active", &self.active.as_ref().map(|a| a.ticket))
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl SpeechBridge {
    pub fn new(
        host: Arc<dyn SpeechHost>,
        notices: Arc<dyn NoticeSink>,
        settings: SpeechSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            host,
            notices,
            settings,
            state: StateMachine::new(),
            active: None,
            next_ticket: 0,
            last_error: None,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Receiver for host recognition events. Available once.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<RecognitionEvent>> {
        self.events_rx.take()
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    pub fn state(&self) -> DictationState {
        self.state.current()
    }

    pub fn is_listening(&self) -> bool {
        self.state.current() == DictationState::Listening
    }

    /// Why the last recognition session failed, cleared on the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Open a recognition session if the host supports it.
    pub fn start_dictation(&mut self) -> StartOutcome {
        if self.is_listening() {
            tracing::debug!("Dictation already listening, ignoring start");
            return StartOutcome::AlreadyListening;
        }

        self.next_ticket += 1;
        let ticket = SessionTicket(self.next_ticket);
        let request = RecognitionRequest::single_utterance(self.settings.dictation_locale.clone());
        let sink = RecognitionSink::new(ticket, self.events_tx.clone());

        match self.host.try_start_dictation(&request, sink) {
            None => {
                tracing::info!("Dictation requested but the host has no speech recognition");
                self.notices.notify(Notice::DictationUnsupported);
                StartOutcome::Unsupported
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Failed to start dictation");
                let reason = e.to_string();
                self.last_error = Some(reason.clone());
                StartOutcome::Failed(reason)
            }
            Some(Ok(mut session)) => {
                if let Err(e) = self.state.transition(DictationState::Listening) {
                    session.stop();
                    return StartOutcome::Failed(e.to_string());
                }
                tracing::info!(
                    ticket = ticket.0,
                    locale = %request.locale,
                    "Dictation listening"
                );
                self.active = Some(ActiveRecognition { ticket, session });
                self.last_error = None;
                StartOutcome::Listening(ticket)
            }
        }
    }

    /// Cancel listening. Returns `false` when nothing was listening.
    pub fn stop_dictation(&mut self) -> bool {
        match self.release() {
            Some(ticket) => {
                tracing::info!(ticket = ticket.0, "Dictation stopped");
                true
            }
            None => false,
        }
    }

    /// Stop when listening, start otherwise.
    pub fn toggle_dictation(&mut self) -> ToggleOutcome {
        if self.stop_dictation() {
            ToggleOutcome::Stopped
        } else {
            ToggleOutcome::Started(self.start_dictation())
        }
    }

    /// Apply a host event to the dictation state.
    pub fn handle_event(&mut self, event: RecognitionEvent) -> DictationUpdate {
        let current = self.active.as_ref().map(|a| a.ticket);
        if current != Some(event.ticket) {
            tracing::debug!(
                ticket = event.ticket.0,
                kind = ?event.kind,
                "Ignoring event from released recognition session"
            );
            return DictationUpdate::Ignored;
        }

        match event.kind {
            RecognitionEventKind::Started => DictationUpdate::Started,
            RecognitionEventKind::Result(transcript) => {
                self.release();
                let transcript = transcript.trim().to_string();
                if transcript.is_empty() {
                    DictationUpdate::Finished
                } else {
                    tracing::debug!(text_len = transcript.len(), "Dictation transcribed");
                    DictationUpdate::Transcript(transcript)
                }
            }
            RecognitionEventKind::End => {
                self.release();
                DictationUpdate::Finished
            }
            RecognitionEventKind::Error(reason) => {
                self.release();
                tracing::warn!(reason = %reason, "Dictation failed");
                self.last_error = Some(reason.clone());
                DictationUpdate::Failed(reason)
            }
        }
    }

    /// Speak `text` in the playback locale. Silently does nothing when the
    /// host cannot speak.
    pub fn speak(&self, text: &str) {
        let utterance = Utterance {
            text: text.to_string(),
            locale: self.settings.playback_locale.clone(),
        };
        match self.host.try_speak(&utterance) {
            None => tracing::debug!("Playback requested but the host has no speech synthesis"),
            Some(Ok(())) => tracing::debug!(
                text_len = text.len(),
                locale = %utterance.locale,
                "Playback requested"
            ),
            Some(Err(e)) => tracing::warn!(error = %e, "Playback failed"),
        }
    }

    fn release(&mut self) -> Option<SessionTicket> {
        let mut active = self.active.take()?;
        active.session.stop();
        self.state.reset();
        Some(active.ticket)
    }
}

impl Drop for SpeechBridge {
    fn drop(&mut self) {
        self.release();
    }
}
