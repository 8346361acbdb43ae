//! Host speech capabilities as an injectable interface.
//!
//! A [`SpeechHost`] answers each request with `None` when the capability is
//! absent, or `Some(result)` when it is present.

use tokio::sync::mpsc::UnboundedSender;

use crate::error::SpeechError;

/// Parameters for one recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    pub locale: String,
    pub interim_results: bool,
    pub max_alternatives: u32,
}

impl RecognitionRequest {
    /// One final result, one alternative, no partial transcripts.
    pub fn single_utterance(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            interim_results: false,
            max_alternatives: 1,
        }
    }
}

/// Text to be spoken aloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
}

/// Identifies the recognition session an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEventKind {
    Started,
    Result(String),
    End,
    Error(String),
}

/// An event reported by the host for a recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub ticket: SessionTicket,
    pub kind: RecognitionEventKind,
}

/// Where a host reports events for one recognition session.
#[derive(Debug, Clone)]
pub struct RecognitionSink {
    ticket: SessionTicket,
    tx: UnboundedSender<RecognitionEvent>,
}

impl RecognitionSink {
    pub fn new(ticket: SessionTicket, tx: UnboundedSender<RecognitionEvent>) -> Self {
        Self { ticket, tx }
    }

    pub fn ticket(&self) -> SessionTicket {
        self.ticket
    }

    pub fn started(&self) {
        self.emit(RecognitionEventKind::Started);
    }

    pub fn result(&self, transcript: impl Into<String>) {
        self.emit(RecognitionEventKind::Result(transcript.into()));
    }

    pub fn end(&self) {
        self.emit(RecognitionEventKind::End);
    }

    pub fn error(&self, reason: impl Into<String>) {
        self.emit(RecognitionEventKind::Error(reason.into()));
    }

    fn emit(&self, kind: RecognitionEventKind) {
        // Nobody listening means the bridge is gone; drop the event.
        let _ = self.tx.send(RecognitionEvent {
            ticket: self.ticket,
            kind,
        });
    }
}

/// A live recognition session owned by the bridge.
pub trait RecognitionSession: Send {
    /// Stop listening. Must be harmless on a session that already ended.
    fn stop(&mut self);
}

/// Host-provided dictation and playback.
pub trait SpeechHost: Send + Sync {
    /// Open a recognition session reporting to `sink`, or `None` if the host
    /// has no speech-to-text.
    fn try_start_dictation(
        &self,
        request: &RecognitionRequest,
        sink: RecognitionSink,
    ) -> Option<Result<Box<dyn RecognitionSession>, SpeechError>>;

    /// Request fire-and-forget playback, or `None` if the host has no
    /// text-to-speech.
    fn try_speak(&self, utterance: &Utterance) -> Option<Result<(), SpeechError>>;
}

/// A host without any speech capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeechHost;

impl SpeechHost for NoSpeechHost {
    fn try_start_dictation(
        &self,
        _request: &RecognitionRequest,
        _sink: RecognitionSink,
    ) -> Option<Result<Box<dyn RecognitionSession>, SpeechError>> {
        None
    }

    fn try_speak(&self, _utterance: &Utterance) -> Option<Result<(), SpeechError>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_utterance_request() {
        let req = RecognitionRequest::single_utterance("en-IN");
        assert_eq!(req.locale, "en-IN");
        assert!(!req.interim_results);
        assert_eq!(req.max_alternatives, 1);
    }

    #[test]
    fn test_sink_tags_events_with_ticket() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = RecognitionSink::new(SessionTicket(3), tx);
        sink.started();
        sink.result("hello");
        sink.error("no-speech");
        sink.end();

        let kinds: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .inspect(|e| assert_eq!(e.ticket, SessionTicket(3)))
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                RecognitionEventKind::Started,
                RecognitionEventKind::Result("hello".to_string()),
                RecognitionEventKind::Error("no-speech".to_string()),
                RecognitionEventKind::End,
            ]
        );
    }

    #[test]
    fn test_sink_without_receiver_does_not_panic() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        RecognitionSink::new(SessionTicket(1), tx).end();
    }

    #[test]
    fn test_no_speech_host_supports_nothing() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let host = NoSpeechHost;
        let sink = RecognitionSink::new(SessionTicket(1), tx);
        assert!(host
            .try_start_dictation(&RecognitionRequest::single_utterance("en-IN"), sink)
            .is_none());
        assert!(host
            .try_speak(&Utterance {
                text: "hello".to_string(),
                locale: "hi-IN".to_string(),
            })
            .is_none());
    }
}
