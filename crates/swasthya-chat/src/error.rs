//! Error types for the chat engine.

use swasthya_core::error::SwasthyaError;

/// Errors raised while building a reply catalog.
///
/// Selecting a reply and taking turns never fail; only catalog construction
/// from configuration can.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("catalog must contain at least one entry")]
    EmptyCatalog,
    #[error("catalog entry {0} is blank")]
    BlankEntry(usize),
    #[error("keyword group '{group}' points at entry {entry}, but the catalog has {len} entries")]
    EntryOutOfRange {
        group: String,
        entry: usize,
        len: usize,
    },
    #[error("keyword group '{0}' has no keywords")]
    EmptyGroup(String),
}

impl From<ChatError> for SwasthyaError {
    fn from(err: ChatError) -> Self {
        SwasthyaError::Catalog(err.to_string())
    }
}
