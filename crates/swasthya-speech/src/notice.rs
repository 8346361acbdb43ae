//! User-visible notices raised by the speech bridge.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notice {
    /// Dictation was requested on a host without speech-to-text.
    DictationUnsupported,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DictationUnsupported => {
                write!(f, "Speech recognition is not supported on this device")
            }
        }
    }
}

/// Shows notices to the user.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, notice: Notice) {
        tracing::warn!(notice = %notice, "User notice");
    }
}
