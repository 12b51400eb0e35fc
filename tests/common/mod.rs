//! Shared test utilities
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley::conversation::Sender;
use parley::voice::{
    PassSender, RecognitionError, RecognitionEvent, RecognitionResult, RecognitionSettings,
    Recognizer, SynthesisEvent, Synthesizer, Utterance, Voice,
};
use parley::{ChatBackend, Entry, Error, LanguageModel, Result, SessionId, View};
use tokio::sync::mpsc;

/// Everything a view was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Message {
        index: usize,
        sender: Sender,
        text: String,
        replayable: bool,
    },
    ClearHistory,
    ClearInput,
    SetInput(String),
    Report(String),
    Listening(bool),
    Speaking(bool),
    Alert(String),
    Prompt,
}

/// View that records every call
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<(Sender, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::Message { sender, text, .. } => Some((sender, text)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ViewEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl View for RecordingView {
    fn render_message(&self, entry: &Entry<'_>) {
        self.push(ViewEvent::Message {
            index: entry.index,
            sender: entry.sender,
            text: entry.text.to_string(),
            replayable: entry.replay.is_some(),
        });
    }

    fn clear_history(&self) {
        self.push(ViewEvent::ClearHistory);
    }

    fn clear_input(&self) {
        self.push(ViewEvent::ClearInput);
    }

    fn set_input(&self, text: &str) {
        self.push(ViewEvent::SetInput(text.to_string()));
    }

    fn show_report(&self, report: &str) {
        self.push(ViewEvent::Report(report.to_string()));
    }

    fn set_listening(&self, listening: bool) {
        self.push(ViewEvent::Listening(listening));
    }

    fn set_speaking(&self, speaking: bool) {
        self.push(ViewEvent::Speaking(speaking));
    }

    fn alert(&self, message: &str) {
        self.push(ViewEvent::Alert(message.to_string()));
    }

    fn prompt(&self) {
        self.push(ViewEvent::Prompt);
    }
}

/// Calls a backend received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Generate { user_input: String, session_id: String },
    Report {
        conversation_text: String,
        session_id: String,
    },
}

/// Backend answering from a queue of scripted outcomes
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    reports: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn fail_reply(&self, status: u16) {
        self.replies.lock().unwrap().push_back(Err(Error::Backend {
            status,
            body: String::new(),
        }));
    }

    pub fn report(&self, text: &str) {
        self.reports.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn fail_report(&self) {
        self.reports
            .lock()
            .unwrap()
            .push_back(Err(Error::Backend {
                status: 500,
                body: String::new(),
            }));
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn generate_response(&self, user_input: &str, session_id: &SessionId) -> Result<String> {
        self.calls.lock().unwrap().push(BackendCall::Generate {
            user_input: user_input.to_string(),
            session_id: session_id.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Backend { status: 503, body: "unscripted".to_string() }))
    }

    async fn conversation_report(
        &self,
        conversation_text: &str,
        session_id: &SessionId,
    ) -> Result<String> {
        self.calls.lock().unwrap().push(BackendCall::Report {
            conversation_text: conversation_text.to_string(),
            session_id: session_id.to_string(),
        });
        self.reports
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Backend { status: 503, body: "unscripted".to_string() }))
    }
}

/// Calls a synthesis engine received
#[derive(Debug, Clone, PartialEq)]
pub enum SynthCall {
    Speak(Utterance),
    Cancel,
}

/// Synthesizer that records calls and lets tests emit events
#[derive(Clone)]
pub struct FakeSynthesizer {
    pub voices: Vec<Voice>,
    pub calls: Arc<Mutex<Vec<SynthCall>>>,
    pub events: Arc<Mutex<Option<mpsc::UnboundedSender<SynthesisEvent>>>>,
}

impl FakeSynthesizer {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            calls: Arc::default(),
            events: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<SynthCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SynthCall::Speak(u) => Some(u),
                SynthCall::Cancel => None,
            })
            .collect()
    }

    /// Emit an event as the engine would
    pub fn emit(&self, event: SynthesisEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            tx.send(event).unwrap();
        }
    }
}

impl Synthesizer for FakeSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(
        &mut self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<SynthesisEvent>,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(SynthCall::Speak(utterance));
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    fn cancel(&mut self) {
        self.calls.lock().unwrap().push(SynthCall::Cancel);
    }
}

/// Recognizer that records calls and lets tests emit events
#[derive(Clone, Default)]
pub struct FakeRecognizer {
    pub fail_start: bool,
    /// Recognized as soon as a pass starts, followed by `End`
    pub answer: Option<String>,
    pub starts: Arc<Mutex<Vec<RecognitionSettings>>>,
    pub stops: Arc<Mutex<usize>>,
    pub events: Arc<Mutex<Option<PassSender>>>,
}

impl FakeRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_start: true,
            ..Self::default()
        }
    }

    pub fn answering(transcript: &str) -> Self {
        Self {
            answer: Some(transcript.to_string()),
            ..Self::default()
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.lock().unwrap().len()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }

    /// Emit an event for the most recent pass
    pub fn emit(&self, event: RecognitionEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            assert!(tx.send(event));
        }
    }
}

impl Recognizer for FakeRecognizer {
    fn start(
        &mut self,
        settings: &RecognitionSettings,
        events: PassSender,
    ) -> std::result::Result<(), RecognitionError> {
        if self.fail_start {
            return Err(RecognitionError::StartFailed);
        }
        self.starts.lock().unwrap().push(settings.clone());
        if let Some(answer) = &self.answer {
            events.send(RecognitionEvent::Result(vec![RecognitionResult::single(answer.clone())]));
            events.send(RecognitionEvent::End);
        }
        *self.events.lock().unwrap() = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        *self.stops.lock().unwrap() += 1;
    }
}

/// Language model answering from a queue, recording prompts
#[derive(Default)]
pub struct ScriptedModel {
    outputs: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn answer(&self, text: &str) {
        self.outputs.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn fail(&self) {
        self.outputs
            .lock()
            .unwrap()
            .push_back(Err(Error::Model("quota exceeded".to_string())));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Model("unscripted".to_string())))
    }
}
