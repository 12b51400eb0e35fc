//! Speech input: single-shot recognition passes

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::ui::View;

/// Shown when no recognizer is available
pub const RECOGNITION_UNAVAILABLE_MESSAGE: &str = "Speech recognition is not supported in this environment. \
     Configure a recorder and a transcription API key to enable it.";

/// Fixed recognition settings handed to the recognizer on every pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub lang: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl RecognitionSettings {
    /// Single-shot, final-results-only settings for `lang`
    #[must_use]
    pub fn single_shot(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self::single_shot("en-US")
    }
}

/// One candidate transcript
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionAlternative {
    pub transcript: String,
    pub confidence: f32,
}

/// One recognized result, best alternative first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecognitionResult {
    pub alternatives: Vec<RecognitionAlternative>,
}

impl RecognitionResult {
    /// Result with a single alternative
    #[must_use]
    pub fn single(transcript: impl Into<String>) -> Self {
        Self {
            alternatives: vec![RecognitionAlternative {
                transcript: transcript.into(),
                confidence: 1.0,
            }],
        }
    }
}

/// Events a recognizer delivers for a pass
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    Result(Vec<RecognitionResult>),
    /// Platform error code, e.g. `no-speech`
    Error(String),
    End,
}

/// A [`RecognitionEvent`] tagged with the pass that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct PassEvent {
    pub pass: u64,
    pub event: RecognitionEvent,
}

/// Event sink handed to a [`Recognizer`] for one pass
#[derive(Debug, Clone)]
pub struct PassSender {
    pass: u64,
    tx: mpsc::UnboundedSender<PassEvent>,
}

impl PassSender {
    #[must_use]
    pub const fn pass(&self) -> u64 {
        self.pass
    }

    /// Deliver an event for this pass; `false` once the adapter is gone
    pub fn send(&self, event: RecognitionEvent) -> bool {
        self.tx
            .send(PassEvent {
                pass: self.pass,
                event,
            })
            .is_ok()
    }
}

/// User-facing recognition error categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    Network,
    NoSpeech,
    NotAllowed,
    ServiceNotAllowed,
    StartFailed,
    Other(String),
}

impl RecognitionError {
    /// Classify a platform error code
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "network" => Self::Network,
            "no-speech" => Self::NoSpeech,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "start-error" => Self::StartFailed,
            other => Self::Other(other.to_string()),
        }
    }

    /// Platform error code
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Network => "network",
            Self::NoSpeech => "no-speech",
            Self::NotAllowed => "not-allowed",
            Self::ServiceNotAllowed => "service-not-allowed",
            Self::StartFailed => "start-error",
            Self::Other(code) => code,
        }
    }

    /// Fixed human-readable message
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Network => "Network error occurred. Please check your connection.",
            Self::NoSpeech => "No speech was detected. Please try again.",
            Self::NotAllowed => "Microphone access was denied. Please allow microphone access.",
            Self::ServiceNotAllowed => {
                "Speech recognition service is not allowed. Please try again later."
            }
            Self::StartFailed | Self::Other(_) => "An error occurred with speech recognition.",
        }
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for RecognitionError {}

/// Platform speech-recognition capability
pub trait Recognizer: Send {
    /// Begin a pass; events for it are sent on `events`
    ///
    /// # Errors
    ///
    /// Returns error if the pass cannot be started
    fn start(
        &mut self,
        settings: &RecognitionSettings,
        events: PassSender,
    ) -> std::result::Result<(), RecognitionError>;

    /// Abort the active pass, if any
    fn stop(&mut self);
}

type TranscriptCallback = Box<dyn FnOnce(String) + Send>;

/// Wraps a [`Recognizer`] with an Idle/Listening state machine
pub struct SpeechInput {
    recognizer: Option<Box<dyn Recognizer>>,
    settings: RecognitionSettings,
    view: Arc<dyn View>,
    listening: bool,
    /// Pass whose events are accepted
    current_pass: Option<u64>,
    last_pass: u64,
    on_transcript: Option<TranscriptCallback>,
    events_tx: mpsc::UnboundedSender<PassEvent>,
    events_rx: mpsc::UnboundedReceiver<PassEvent>,
}

impl SpeechInput {
    /// Create an adapter; `None` means the capability is unavailable
    #[must_use]
    pub fn new(
        recognizer: Option<Box<dyn Recognizer>>,
        settings: RecognitionSettings,
        view: Arc<dyn View>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            recognizer,
            settings,
            view,
            listening: false,
            current_pass: None,
            last_pass: 0,
            on_transcript: None,
            events_tx,
            events_rx,
        }
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Begin a single recognition pass
    ///
    /// `on_transcript` runs at most once, with the best transcript of the
    /// first result.
    pub fn start_listening(&mut self, on_transcript: impl FnOnce(String) + Send + 'static) {
        let Some(recognizer) = self.recognizer.as_mut() else {
            self.view.alert(RECOGNITION_UNAVAILABLE_MESSAGE);
            return;
        };

        if self.listening {
            tracing::warn!("recognition already active, ignoring start");
            return;
        }

        self.last_pass += 1;
        let events = PassSender {
            pass: self.last_pass,
            tx: self.events_tx.clone(),
        };

        match recognizer.start(&self.settings, events) {
            Ok(()) => {
                tracing::debug!(pass = self.last_pass, lang = %self.settings.lang, "recognition started");
                self.current_pass = Some(self.last_pass);
                self.on_transcript = Some(Box::new(on_transcript));
                self.set_listening(true);
            }
            Err(e) => {
                tracing::error!(code = e.code(), "failed to start recognition");
                self.view.alert(e.message());
            }
        }
    }

    /// Abort the active pass. Safe when idle
    pub fn stop_listening(&mut self) {
        if !self.listening {
            return;
        }
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
        self.current_pass = None;
        self.on_transcript = None;
        self.set_listening(false);
        tracing::debug!("recognition stopped");
    }

    /// Wait for the next recognizer event
    pub async fn next_event(&mut self) -> Option<PassEvent> {
        self.events_rx.recv().await
    }

    /// Apply a recognizer event; events from earlier passes are ignored
    pub fn handle_event(&mut self, event: PassEvent) {
        if self.current_pass != Some(event.pass) {
            tracing::trace!(pass = event.pass, "ignoring event from stale recognition pass");
            return;
        }
        self.current_pass = None;

        match event.event {
            RecognitionEvent::Result(results) => {
                let transcript = results
                    .into_iter()
                    .next()
                    .and_then(|r| r.alternatives.into_iter().next())
                    .map(|a| a.transcript);

                if let (Some(text), Some(callback)) = (transcript, self.on_transcript.take()) {
                    tracing::info!(transcript = %text, "recognized speech");
                    callback(text);
                } else {
                    tracing::debug!("recognition result without alternatives");
                }
                self.set_listening(false);
            }
            RecognitionEvent::Error(code) => {
                let error = RecognitionError::from_code(&code);
                tracing::error!(code = %code, "speech recognition error");
                self.on_transcript = None;
                self.view.alert(error.message());
                self.set_listening(false);
            }
            RecognitionEvent::End => {
                self.on_transcript = None;
                self.set_listening(false);
            }
        }
    }

    fn set_listening(&mut self, listening: bool) {
        if self.listening != listening {
            self.listening = listening;
            self.view.set_listening(listening);
        }
    }
}
