//! Error types for the speech bridge.

use swasthya_core::error::SwasthyaError;

use crate::state::DictationState;

/// Errors from host speech capabilities.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("failed to launch {what}: {reason}")]
    Launch { what: &'static str, reason: String },
    #[error("recognition failed: {0}")]
    Recognition(String),
    #[error("invalid dictation transition: {from} -> {to}")]
    InvalidTransition {
        from: DictationState,
        to: DictationState,
    },
}

impl From<SpeechError> for SwasthyaError {
    fn from(err: SpeechError) -> Self {
        SwasthyaError::Speech(err.to_string())
    }
}
