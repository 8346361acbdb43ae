//! CLI argument definitions for the Swasthya application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use swasthya_core::config::SwasthyaConfig;

/// Swasthya: a scripted health assistant for the terminal.
#[derive(Parser, Debug, Default)]
#[command(name = "swasthya", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Delay before the assistant replies, in milliseconds.
    #[arg(long = "reply-delay-ms")]
    pub reply_delay_ms: Option<u64>,

    /// Seed for the fallback reply picker.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Open the chat panel directly instead of the dashboard.
    #[arg(long = "chat")]
    pub chat: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SWASTHYA_CONFIG env var > ~/.swasthya/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SWASTHYA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut SwasthyaConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(delay) = self.reply_delay_ms {
            config.chat.reply_delay_ms = delay;
        }
        if let Some(seed) = self.seed {
            config.chat.random_seed = Some(seed);
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".swasthya").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".swasthya").join("config.toml");
    }
    PathBuf::from("config.toml")
}
