//! Conversational core of the health assistant.
//!
//! Provides the canned reply catalog with keyword routing, the per-session
//! turn manager, and the injectable scheduler and random sources it runs on.

pub mod catalog;
pub mod conversation;
pub mod error;
pub mod picker;
pub mod scheduler;
pub mod turn;

pub use catalog::{KeywordGroup, ResponseCatalog};
pub use conversation::Conversation;
pub use error::ChatError;
pub use picker::{FixedIndex, IndexSource, SeededRandom, ThreadRandom};
pub use scheduler::{ManualScheduler, ReplyHandle, ReplyScheduler, ReplyTask, TokioScheduler};
pub use turn::{TurnManager, DEFAULT_REPLY_DELAY};
