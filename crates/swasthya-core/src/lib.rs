//! Shared types, configuration, errors and events for the Swasthya health
//! assistant.

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::SwasthyaConfig;
pub use error::{Result, SwasthyaError};
pub use events::ChatEvent;
pub use types::*;
