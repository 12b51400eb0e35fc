//! Interactive chat loop
//!
//! One task drives everything: typed lines, recognized transcripts and the
//! speech adapters' events are multiplexed with `tokio::select!`, so the
//! controller and both adapters are only ever touched from here.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::Result;
use crate::backend::HttpBackend;
use crate::config::Config;
use crate::conversation::ConversationController;
use crate::ui::{ReplayHandle, View};
use crate::voice::{
    CommandSynthesizer, HttpRecognizer, Recognizer, SpeechInput, SpeechOutput, Synthesizer,
};

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send
    Say(String),
    /// Toggle a voice pass
    Listen,
    /// End the conversation with a report
    Report,
    /// Speak an AI entry again
    Replay(usize),
    Quit,
    Help,
    /// Unrecognized slash command
    Unknown(String),
}

impl Command {
    /// Parse a line typed by the user
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("listen"), None) => Self::Listen,
            (Some("report" | "end"), None) => Self::Report,
            (Some("replay"), Some(n)) => n
                .parse()
                .map_or_else(|_| Self::Unknown(trimmed.to_string()), Self::Replay),
            (Some("quit" | "exit"), None) => Self::Quit,
            (Some("help"), None) => Self::Help,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}

const HELP: &str = "Type a message and press Enter to send it.\n\
    /listen      start (or stop) a voice pass\n\
    /replay N    speak AI entry N again\n\
    /report      end the conversation and show a report\n\
    /quit        exit";

/// Wires the controller and speech adapters to an input source
pub struct ChatApp {
    controller: ConversationController,
    input: SpeechInput,
    view: Arc<dyn View>,
    transcripts_tx: mpsc::UnboundedSender<String>,
    transcripts_rx: mpsc::UnboundedReceiver<String>,
}

impl ChatApp {
    #[must_use]
    pub fn new(controller: ConversationController, input: SpeechInput, view: Arc<dyn View>) -> Self {
        let (transcripts_tx, transcripts_rx) = mpsc::unbounded_channel();
        Self {
            controller,
            input,
            view,
            transcripts_tx,
            transcripts_rx,
        }
    }

    /// Build the app from configuration with the shipped speech engines
    ///
    /// # Errors
    ///
    /// Returns error if the backend client cannot be built
    pub fn from_config(config: &Config, view: Arc<dyn View>) -> Result<Self> {
        let backend = HttpBackend::new(&config.client.backend_url, config.client.request_timeout)?;

        let synthesizer: Option<Box<dyn Synthesizer>> = if config.synthesis.enabled {
            CommandSynthesizer::new(config.synthesis.program.clone(), config.synthesis.voices.clone())
                .map_err(|e| tracing::warn!(error = %e, "speech synthesis unavailable"))
                .ok()
                .map(|s| Box::new(s) as Box<dyn Synthesizer>)
        } else {
            None
        };

        let recognizer: Option<Box<dyn Recognizer>> = match (&config.api_keys.openai, config.recognition.enabled) {
            (Some(key), true) => HttpRecognizer::new(
                key.clone(),
                config.recognition.stt_url.clone(),
                config.recognition.stt_model.clone(),
                config.recognition.record_command.clone(),
            )
            .map_err(|e| tracing::warn!(error = %e, "speech recognition unavailable"))
            .ok()
            .map(|r| Box::new(r) as Box<dyn Recognizer>),
            (None, true) => {
                tracing::info!("no transcription API key, speech recognition unavailable");
                None
            }
            (_, false) => None,
        };

        let speech = SpeechOutput::new(synthesizer, view.clone())
            .with_prosody(config.synthesis.rate, config.synthesis.pitch);
        let controller = ConversationController::new(Arc::new(backend), view.clone(), speech);
        let input = SpeechInput::new(recognizer, config.recognition.settings(), view.clone());

        Ok(Self::new(controller, input, view))
    }

    #[must_use]
    pub const fn controller(&self) -> &ConversationController {
        &self.controller
    }

    #[must_use]
    pub const fn input(&self) -> &SpeechInput {
        &self.input
    }

    /// Apply one command; returns `false` when the loop should stop
    pub async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Say(text) => self.controller.send_message(&text).await,
            Command::Listen => self.toggle_listening(),
            Command::Report => self.controller.generate_report().await,
            Command::Replay(index) => self.controller.replay(ReplayHandle(index)),
            Command::Help => self.view.alert(HELP),
            Command::Unknown(raw) => self.view.alert(&format!("Unknown command: {raw} (try /help)")),
            Command::Quit => return false,
        }
        true
    }

    fn toggle_listening(&mut self) {
        if self.input.is_listening() {
            self.input.stop_listening();
        } else {
            let transcripts = self.transcripts_tx.clone();
            self.input.start_listening(move |transcript| {
                let _ = transcripts.send(transcript);
            });
        }
    }

    /// Run until the input closes, `/quit`, or Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if reading input fails
    pub async fn run<R>(&mut self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        self.run_until(reader, ctrl_c).await
    }

    /// Run until the input closes, `/quit`, or `shutdown` resolves
    ///
    /// `shutdown` lives for the whole session and also interrupts a pending
    /// send or report.
    ///
    /// # Errors
    ///
    /// Returns error if reading input fails
    pub async fn run_until<R, S>(&mut self, reader: R, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        let mut lines = reader.lines();
        tokio::pin!(shutdown);

        self.view.prompt();

        loop {
            let step = tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => Step::Command(Command::parse(&line)),
                    None => {
                        tracing::debug!("input closed");
                        break;
                    }
                },
                Some(transcript) = self.transcripts_rx.recv() => Step::Transcript(transcript),
                Some(event) = self.input.next_event() => {
                    self.input.handle_event(event);
                    continue;
                }
                Some(event) = self.controller.speech_mut().next_event() => {
                    self.controller.speech_mut().handle_event(event);
                    continue;
                }
                () = &mut shutdown => {
                    tracing::info!("interrupted");
                    break;
                }
            };

            let keep_running = tokio::select! {
                keep = self.apply(step) => keep,
                () = &mut shutdown => {
                    tracing::info!("interrupted while waiting for the backend");
                    false
                }
            };
            if !keep_running {
                break;
            }
            self.view.prompt();
        }

        self.input.stop_listening();
        self.controller.speech_mut().cancel();
        Ok(())
    }

    async fn apply(&mut self, step: Step) -> bool {
        match step {
            Step::Command(command) => self.handle_command(command).await,
            Step::Transcript(transcript) => {
                self.view.set_input(&transcript);
                self.controller.send_message(&transcript).await;
                true
            }
        }
    }
}

/// Work picked by one turn of the chat loop
enum Step {
    Command(Command),
    /// Recognized speech, sent like a typed line
    Transcript(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text() {
        assert_eq!(Command::parse("hello there"), Command::Say("hello there".to_string()));
        assert_eq!(Command::parse("   "), Command::Say("   ".to_string()));
    }

    #[test]
    fn parses_slash_commands() {
        assert_eq!(Command::parse("/listen"), Command::Listen);
        assert_eq!(Command::parse(" /report "), Command::Report);
        assert_eq!(Command::parse("/end"), Command::Report);
        assert_eq!(Command::parse("/replay 3"), Command::Replay(3));
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/help"), Command::Help);
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(Command::parse("/replay x"), Command::Unknown("/replay x".to_string()));
        assert_eq!(Command::parse("/replay"), Command::Unknown("/replay".to_string()));
        assert_eq!(Command::parse("/dance"), Command::Unknown("/dance".to_string()));
    }
}
