//! Terminal presentation shell: dashboard view and chat panel.
//!
//! The shell only turns input lines and async events into calls on the turn
//! manager and speech bridge, and renders what they report.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use swasthya_chat::{IndexSource, ReplyScheduler, ResponseCatalog, TurnManager};
use swasthya_core::events::ChatEvent;
use swasthya_core::types::{Message, MessageId, Origin};
use swasthya_speech::{
    DictationUpdate, Notice, NoticeSink, RecognitionEvent, SpeechBridge, StartOutcome,
    ToggleOutcome,
};

use crate::dashboard;

const CHAT_HELP: &str = "Commands: /send (send dictated text), /mic (start/stop dictation), \
/play <id> (read a reply aloud), /history, /close (back to dashboard), /quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Collects notices until the shell renders them.
#[derive(Debug, Default)]
pub struct QueuedNotices {
    queue: Mutex<Vec<Notice>>,
}

impl QueuedNotices {
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl NoticeSink for QueuedNotices {
    fn notify(&self, notice: Notice) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

/// What the shell needs to open chat sessions.
pub struct ChatWiring {
    pub catalog: Arc<ResponseCatalog>,
    pub picker: Arc<dyn IndexSource>,
    pub scheduler: Arc<dyn ReplyScheduler>,
    pub reply_delay: Duration,
    pub greeting: String,
    pub events: UnboundedSender<ChatEvent>,
}

pub struct Shell<W: Write> {
    out: W,
    view: View,
    wiring: ChatWiring,
    turns: Option<TurnManager>,
    bridge: SpeechBridge,
    notices: Arc<QueuedNotices>,
}

impl<W: Write> Shell<W> {
    /// `notices` must be the sink the bridge was built with.
    pub fn new(
        out: W,
        wiring: ChatWiring,
        bridge: SpeechBridge,
        notices: Arc<QueuedNotices>,
    ) -> Self {
        Self {
            out,
            view: View::Dashboard,
            wiring,
            turns: None,
            bridge,
            notices,
        }
    }

    #[cfg(test)]
    pub fn view(&self) -> View {
        self.view
    }

    #[cfg(test)]
    pub fn writer(&self) -> &W {
        &self.out
    }

    #[cfg(test)]
    pub fn turns(&self) -> Option<&TurnManager> {
        self.turns.as_ref()
    }

    #[cfg(test)]
    pub fn bridge(&self) -> &SpeechBridge {
        &self.bridge
    }

    /// Render the first view.
    pub fn start(&mut self, open_chat: bool) -> io::Result<()> {
        if open_chat {
            self.open_chat()
        } else {
            dashboard::render(&mut self.out)
        }
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        match self.view {
            View::Dashboard => write!(self.out, "> ")?,
            View::Chat if self.bridge.is_listening() => write!(self.out, "[listening] you> ")?,
            View::Chat => write!(self.out, "you> ")?,
        }
        self.out.flush()
    }

    /// Handle one line of user input.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let flow = match self.view {
            View::Dashboard => self.dashboard_line(line.trim())?,
            View::Chat => self.chat_line(line)?,
        };
        self.flush_notices()?;
        Ok(flow)
    }

    fn dashboard_line(&mut self, line: &str) -> io::Result<Flow> {
        match line {
            "quit" | "exit" => return Ok(Flow::Quit),
            "chat" => self.open_chat()?,
            "" => dashboard::render(&mut self.out)?,
            other => match dashboard::topic_by_number(other) {
                Some(topic) => {
                    tracing::debug!(topic = topic.title, "Topic selected");
                    self.open_chat()?;
                }
                None => writeln!(
                    self.out,
                    "Type a topic number (1-{}), 'chat' or 'quit'.",
                    dashboard::TOPICS.len()
                )?,
            },
        }
        Ok(Flow::Continue)
    }

    fn chat_line(&mut self, line: &str) -> io::Result<Flow> {
        let trimmed = line.trim();
        let (command, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (trimmed, ""),
        };

        match command {
            "/quit" => return Ok(Flow::Quit),
            "/close" => self.close_chat()?,
            "/help" => writeln!(self.out, "{}", CHAT_HELP)?,
            "/history" => self.render_history()?,
            "/mic" => self.toggle_mic()?,
            "/play" => self.play(arg)?,
            "/send" | "" => self.send_pending()?,
            c if c.starts_with('/') => {
                writeln!(self.out, "Unknown command {}. {}", c, CHAT_HELP)?
            }
            _ => {
                if let Some(turns) = self.turns.as_mut() {
                    turns.set_pending_input(trimmed);
                }
                self.send_pending()?;
            }
        }
        Ok(Flow::Continue)
    }

    fn open_chat(&mut self) -> io::Result<()> {
        let turns = TurnManager::new(
            Arc::clone(&self.wiring.catalog),
            Arc::clone(&self.wiring.picker),
            Arc::clone(&self.wiring.scheduler),
        )
        .with_reply_delay(self.wiring.reply_delay)
        .with_events(self.wiring.events.clone());
        self.turns = Some(turns);
        self.view = View::Chat;

        writeln!(self.out)?;
        writeln!(
            self.out,
            "---- {} · {} ----",
            dashboard::TITLE,
            dashboard::SUBTITLE
        )?;
        writeln!(self.out, "Assistant: {}", self.wiring.greeting)?;
        writeln!(self.out, "({})", dashboard::LANGUAGE_HINT)?;
        writeln!(self.out, "{}", CHAT_HELP)?;
        Ok(())
    }

    fn close_chat(&mut self) -> io::Result<()> {
        self.bridge.stop_dictation();
        if let Some(turns) = self.turns.take() {
            turns.close();
        }
        self.view = View::Dashboard;
        writeln!(self.out, "Chat closed.")?;
        writeln!(self.out)?;
        dashboard::render(&mut self.out)
    }

    fn send_pending(&mut self) -> io::Result<()> {
        let Some(turns) = self.turns.as_mut() else {
            return Ok(());
        };
        if let Some(message) = turns.submit_pending() {
            write_message(&mut self.out, &message)?;
            writeln!(self.out, "(assistant is typing...)")?;
        }
        Ok(())
    }

    fn toggle_mic(&mut self) -> io::Result<()> {
        match self.bridge.toggle_dictation() {
            ToggleOutcome::Stopped => writeln!(self.out, "Stopped listening.")?,
            ToggleOutcome::Started(StartOutcome::Listening(_)) => {
                writeln!(self.out, "Listening... speak now (/mic to stop).")?
            }
            ToggleOutcome::Started(StartOutcome::AlreadyListening) => {}
            // The notice is rendered by flush_notices.
            ToggleOutcome::Started(StartOutcome::Unsupported) => {}
            ToggleOutcome::Started(StartOutcome::Failed(reason)) => {
                writeln!(self.out, "Could not start dictation: {}", reason)?
            }
        }
        Ok(())
    }

    fn play(&mut self, arg: &str) -> io::Result<()> {
        let Some(turns) = self.turns.as_ref() else {
            return Ok(());
        };
        let message = arg
            .parse::<MessageId>()
            .ok()
            .and_then(|id| turns.message(id))
            .filter(|m| m.origin == Origin::Assistant);
        match message {
            Some(message) => self.bridge.speak(&message.text),
            None => writeln!(self.out, "No assistant reply with id '{}'.", arg)?,
        }
        Ok(())
    }

    fn render_history(&mut self) -> io::Result<()> {
        let Some(turns) = self.turns.as_ref() else {
            return Ok(());
        };
        writeln!(self.out, "Assistant: {}", self.wiring.greeting)?;
        for message in turns.conversation() {
            write_message(&mut self.out, &message)?;
        }
        Ok(())
    }

    /// Render a message event from the active session.
    pub fn on_chat_event(&mut self, event: ChatEvent) -> io::Result<()> {
        let active = self.turns.as_ref().map(TurnManager::session_id);
        if active != Some(event.session_id()) {
            return Ok(());
        }
        if let ChatEvent::MessageAppended { message, .. } = event {
            // User messages are echoed when submitted.
            if message.origin == Origin::Assistant {
                writeln!(self.out)?;
                write_message(&mut self.out, &message)?;
            }
        }
        Ok(())
    }

    /// Apply a recognition event and render its outcome.
    pub fn on_recognition_event(&mut self, event: RecognitionEvent) -> io::Result<()> {
        match self.bridge.handle_event(event) {
            DictationUpdate::Transcript(text) => {
                writeln!(self.out)?;
                writeln!(self.out, "Heard: \"{}\"", text)?;
                writeln!(
                    self.out,
                    "Press Enter to send it, or type a new message."
                )?;
                if let Some(turns) = self.turns.as_mut() {
                    turns.set_pending_input(text);
                }
            }
            DictationUpdate::Finished => writeln!(self.out, "\nStopped listening.")?,
            DictationUpdate::Failed(reason) => {
                writeln!(self.out, "\nDictation failed: {}", reason)?
            }
            DictationUpdate::Started | DictationUpdate::Ignored => {}
        }
        Ok(())
    }

    fn flush_notices(&mut self) -> io::Result<()> {
        for notice in self.notices.drain() {
            writeln!(self.out, "[!] {}", notice)?;
        }
        Ok(())
    }
}

fn write_message<W: Write>(out: &mut W, message: &Message) -> io::Result<()> {
    match message.origin {
        Origin::User => writeln!(out, "[#{}] {}: {}", message.id, message.origin, message.text),
        Origin::Assistant => writeln!(
            out,
            "[#{}] {}: {}  (/play {})",
            message.id, message.origin, message.text, message.id
        ),
    }
}
