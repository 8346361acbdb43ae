//! Speech host backed by external programs.
//!
//! Dictation runs a program that records one utterance and prints its
//! transcript on stdout; the first non-blank line is the result. Playback runs
//! a program that speaks its arguments. `{lang}` and `{text}` in the
//! configured arguments are replaced before launch. A capability without a
//! configured program is reported as absent.

use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::oneshot;

use swasthya_core::config::{CommandConfig, SpeechConfig};

use crate::error::SpeechError;
use crate::host::{RecognitionRequest, RecognitionSession, RecognitionSink, SpeechHost, Utterance};

/// A [`SpeechHost`] that shells out to configured programs.
#[derive(Debug, Clone, Default)]
pub struct CommandSpeechHost {
    dictation: Option<CommandConfig>,
    playback: Option<CommandConfig>,
}

impl CommandSpeechHost {
    pub fn new(dictation: Option<CommandConfig>, playback: Option<CommandConfig>) -> Self {
        Self {
            dictation,
            playback,
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Self {
        Self::new(
            config.dictation_command.clone(),
            config.playback_command.clone(),
        )
    }

    pub fn supports_dictation(&self) -> bool {
        self.dictation.is_some()
    }

    pub fn supports_playback(&self) -> bool {
        self.playback.is_some()
    }
}

/// Substitute `{lang}` and `{text}` in each argument.
pub fn expand_args(args: &[String], lang: &str, text: &str) -> Vec<String> {
    args.iter()
        .map(|a| a.replace("{lang}", lang).replace("{text}", text))
        .collect()
}

fn runtime(what: &'static str) -> Result<tokio::runtime::Handle, SpeechError> {
    tokio::runtime::Handle::try_current().map_err(|e| SpeechError::Launch {
        what,
        reason: e.to_string(),
    })
}

struct CommandSession {
    cancel: Option<oneshot::Sender<()>>,
}

impl RecognitionSession for CommandSession {
    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // The task may have finished already.
            let _ = cancel.send(());
        }
    }
}

async fn read_transcript(
    child: &mut Child,
    stdout: Option<ChildStdout>,
) -> std::io::Result<(ExitStatus, String)> {
    let mut output = String::new();
    if let Some(mut stdout) = stdout {
        stdout.read_to_string(&mut output).await?;
    }
    let status = child.wait().await?;
    Ok((status, output))
}

impl SpeechHost for CommandSpeechHost {
    fn try_start_dictation(
        &self,
        request: &RecognitionRequest,
        sink: RecognitionSink,
    ) -> Option<Result<Box<dyn RecognitionSession>, SpeechError>> {
        let config = self.dictation.as_ref()?;
        let what = "dictation command";

        let launch = || -> Result<Box<dyn RecognitionSession>, SpeechError> {
            let runtime = runtime(what)?;
            let _guard = runtime.enter();
            let mut child = Command::new(&config.program)
                .args(expand_args(&config.args, &request.locale, ""))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| SpeechError::Launch {
                    what,
                    reason: e.to_string(),
                })?;

            tracing::debug!(program = %config.program, ticket = sink.ticket().0, "Dictation command launched");
            let (cancel_tx, cancel_rx) = oneshot::channel();
            runtime.spawn(async move {
                sink.started();
                let stdout = child.stdout.take();
                let outcome = tokio::select! {
                    res = read_transcript(&mut child, stdout) => Some(res),
                    // Stopped, or the session was dropped.
                    _ = cancel_rx => None,
                };
                match outcome {
                    None => sink.end(),
                    Some(Ok((status, output))) if status.success() => {
                        if let Some(line) = output.lines().map(str::trim).find(|l| !l.is_empty()) {
                            sink.result(line);
                        }
                        sink.end();
                    }
                    Some(Ok((status, _))) => {
                        sink.error(format!("dictation command exited with {}", status));
                    }
                    Some(Err(e)) => sink.error(e.to_string()),
                }
            });

            Ok(Box::new(CommandSession {
                cancel: Some(cancel_tx),
            }))
        };

        Some(launch())
    }

    fn try_speak(&self, utterance: &Utterance) -> Option<Result<(), SpeechError>> {
        let config = self.playback.as_ref()?;
        let what = "playback command";

        let launch = || -> Result<(), SpeechError> {
            let runtime = runtime(what)?;
            let _guard = runtime.enter();
            let mut child = Command::new(&config.program)
                .args(expand_args(&config.args, &utterance.locale, &utterance.text))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| SpeechError::Launch {
                    what,
                    reason: e.to_string(),
                })?;

            let program = config.program.clone();
            runtime.spawn(async move {
                match child.wait().await {
                    Ok(status) if !status.success() => {
                        tracing::warn!(program = %program, status = %status, "Playback command failed");
                    }
                    Err(e) => tracing::warn!(program = %program, error = %e, "Playback command failed"),
                    Ok(_) => {}
                }
            });
            Ok(())
        };

        Some(launch())
    }
}
