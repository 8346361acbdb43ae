//! Speech bridge for the health assistant.
//!
//! Wraps host speech-to-text (dictation) and text-to-speech (playback) behind
//! an injectable [`SpeechHost`]. Dictation follows a two-state machine:
//! Idle -> Listening -> Idle, with at most one recognition session owned at a
//! time.

pub mod bridge;
pub mod command;
pub mod error;
pub mod host;
pub mod notice;
pub mod state;

pub use bridge::{DictationUpdate, SpeechBridge, SpeechSettings, StartOutcome, ToggleOutcome};
pub use command::CommandSpeechHost;
pub use error::SpeechError;
pub use host::{
    NoSpeechHost, RecognitionEvent, RecognitionEventKind, RecognitionRequest, RecognitionSession,
    RecognitionSink, SessionTicket, SpeechHost, Utterance,
};
pub use notice::{LogNotices, Notice, NoticeSink};
pub use state::DictationState;
