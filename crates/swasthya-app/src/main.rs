//! Swasthya application binary - composition root.
//!
//! 1. Parse CLI flags, start tracing, then load configuration from TOML
//! 2. Build the response catalog and reply picker
//! 3. Wire the turn manager scheduler and the speech bridge
//! 4. Drive the terminal shell from stdin lines and async events

mod cli;
mod dashboard;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use swasthya_chat::{
    IndexSource, ResponseCatalog, SeededRandom, ThreadRandom, TokioScheduler,
};
use swasthya_core::config::SwasthyaConfig;
use swasthya_core::SwasthyaError;
use swasthya_speech::{CommandSpeechHost, SpeechBridge, SpeechSettings};

use crate::cli::CliArgs;
use crate::shell::{ChatWiring, Flow, QueuedNotices, Shell};

/// Level used until the config file is read, and when nothing overrides it.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Filter in effect while the config is loading: `RUST_LOG`, then
/// `--log-level`, then the default.
fn startup_filter(args: &CliArgs) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(args.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
    })
}

/// Whether the config file's `log_level` should replace the startup filter.
fn config_sets_log_level(args: &CliArgs) -> bool {
    std::env::var_os("RUST_LOG").is_none() && args.log_level.is_none()
}

/// Resolve, load and override the configuration. A missing or broken file
/// falls back to defaults with a warning.
fn load_config(args: &CliArgs) -> Result<(PathBuf, SwasthyaConfig), SwasthyaError> {
    let path = args.resolve_config_path();
    let mut config = SwasthyaConfig::load_or_default(&path);
    args.apply(&mut config);
    config.validate()?;
    Ok((path, config))
}

fn build_catalog(config: &SwasthyaConfig) -> Result<ResponseCatalog, SwasthyaError> {
    match config.catalog {
        Some(ref catalog) => Ok(ResponseCatalog::from_config(catalog)?),
        None => Ok(ResponseCatalog::builtin()),
    }
}

fn build_picker(seed: Option<u64>) -> Arc<dyn IndexSource> {
    match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing. Stdout belongs to the shell.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(startup_filter(&args))
        .with_writer(std::io::stderr)
        .with_filter_reloading();
    let filter = builder.reload_handle();
    builder.init();

    tracing::info!("Starting Swasthya v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let (config_file, config) = load_config(&args)?;
    if config_sets_log_level(&args) {
        filter.reload(EnvFilter::new(&config.general.log_level))?;
    }
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    // Chat.
    let catalog = Arc::new(build_catalog(&config)?);
    tracing::info!(
        entries = catalog.len(),
        groups = catalog.groups().len(),
        "Response catalog ready"
    );
    let (chat_tx, mut chat_rx) = mpsc::unbounded_channel();
    let wiring = ChatWiring {
        catalog,
        picker: build_picker(config.chat.random_seed),
        scheduler: Arc::new(TokioScheduler::current()),
        reply_delay: Duration::from_millis(config.chat.reply_delay_ms),
        greeting: config.chat.greeting.clone(),
        events: chat_tx,
    };

    // Speech.
    let host = CommandSpeechHost::from_config(&config.speech);
    tracing::info!(
        dictation = host.supports_dictation(),
        playback = host.supports_playback(),
        "Speech host ready"
    );
    let notices = Arc::new(QueuedNotices::default());
    let mut bridge = SpeechBridge::new(
        Arc::new(host),
        notices.clone(),
        SpeechSettings::from(&config.speech),
    );
    let mut speech_rx = bridge
        .take_events()
        .ok_or("speech event receiver already taken")?;

    // Shell.
    let mut shell = Shell::new(std::io::stdout(), wiring, bridge, notices);
    shell.start(args.chat)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        shell.prompt()?;
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if shell.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                }
                None => break,
            },
            Some(event) = chat_rx.recv() => shell.on_chat_event(event)?,
            Some(event) = speech_rx.recv() => shell.on_recognition_event(event)?,
        }
    }

    tracing::info!("Goodbye");
    Ok(())
}
