use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, SwasthyaError};

/// Upper bound accepted for the simulated "thinking" delay.
pub const MAX_REPLY_DELAY_MS: u64 = 60_000;

/// Top-level configuration for the assistant.
///
/// Loaded from `~/.swasthya/config.toml` by default. Every section falls back
/// to its defaults when absent, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwasthyaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Replacement reply catalog. `None` keeps the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogConfig>,
}

impl SwasthyaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SwasthyaConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chat.reply_delay_ms > MAX_REPLY_DELAY_MS {
            return Err(SwasthyaError::Config(format!(
                "chat.reply_delay_ms must be at most {}, got {}",
                MAX_REPLY_DELAY_MS, self.chat.reply_delay_ms
            )));
        }
        if self.speech.dictation_locale.trim().is_empty() {
            return Err(SwasthyaError::Config(
                "speech.dictation_locale must not be empty".to_string(),
            ));
        }
        if self.speech.playback_locale.trim().is_empty() {
            return Err(SwasthyaError::Config(
                "speech.playback_locale must not be empty".to_string(),
            ));
        }
        for (key, command) in [
            ("speech.dictation_command", &self.speech.dictation_command),
            ("speech.playback_command", &self.speech.playback_command),
        ] {
            if let Some(command) = command {
                if command.program.trim().is_empty() {
                    return Err(SwasthyaError::Config(format!(
                        "{}.program must not be empty",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Chat panel behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Simulated "thinking" delay before the assistant reply, in milliseconds.
    pub reply_delay_ms: u64,
    /// Welcome line shown in the chat panel header.
    pub greeting: String,
    /// Seed for the fallback reply picker. Unseeded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1500,
            greeting: "Hello! I'm your Health Assistant. I can help you with vaccination \
                       schedules, disease information, and health advice. You can speak to \
                       me in Hindi, English, or your local language. How can I help you today?"
                .to_string(),
            random_seed: None,
        }
    }
}

/// Host speech capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Locale requested from the speech-to-text host.
    pub dictation_locale: String,
    /// Locale requested from the text-to-speech host.
    pub playback_locale: String,
    /// External program that records one utterance and prints its transcript.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictation_command: Option<CommandConfig>,
    /// External program that speaks the text it is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_command: Option<CommandConfig>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            dictation_locale: "en-IN".to_string(),
            playback_locale: "hi-IN".to_string(),
            dictation_command: None,
            playback_command: None,
        }
    }
}

/// An external program invocation.
///
/// `{lang}` and `{text}` inside `args` are replaced with the locale and the
/// utterance before the program is launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// A replacement reply catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Reply strings, in catalog order.
    pub entries: Vec<String>,
    /// Keyword groups in precedence order.
    pub groups: Vec<KeywordGroupConfig>,
}

/// One keyword group routing to a catalog entry by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroupConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub entry: usize,
}
