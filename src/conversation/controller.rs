//! Conversation controller: log, session lifecycle and backend round-trips

use std::sync::Arc;

use super::{ConversationLog, Message, Sender};
use crate::backend::ChatBackend;
use crate::session::SessionId;
use crate::ui::{Entry, ReplayHandle, View};
use crate::voice::SpeechOutput;

/// AI entry appended when a reply cannot be fetched
pub const SEND_FALLBACK_MESSAGE: &str = "Sorry, I encountered an error processing your message.";

/// Alert shown when a report cannot be generated
pub const REPORT_ERROR_MESSAGE: &str = "Error generating conversation report. Please try again.";

/// Wires user actions to the log, the backend and speech output
///
/// Operations take `&mut self`, so sends and reports issued by one event
/// loop are serialized: a report never races a pending send.
pub struct ConversationController {
    backend: Arc<dyn ChatBackend>,
    view: Arc<dyn View>,
    speech: SpeechOutput,
    log: ConversationLog,
    session: SessionId,
}

impl ConversationController {
    #[must_use]
    pub fn new(backend: Arc<dyn ChatBackend>, view: Arc<dyn View>, speech: SpeechOutput) -> Self {
        let session = SessionId::generate();
        tracing::debug!(session = %session, "conversation session started");

        Self {
            backend,
            view,
            speech,
            log: ConversationLog::new(),
            session,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionId {
        &self.session
    }

    #[must_use]
    pub const fn log(&self) -> &ConversationLog {
        &self.log
    }

    #[must_use]
    pub const fn speech(&self) -> &SpeechOutput {
        &self.speech
    }

    pub const fn speech_mut(&mut self) -> &mut SpeechOutput {
        &mut self.speech
    }

    /// Append a message and render it
    pub fn add_message(&mut self, sender: Sender, text: &str) {
        let index = self.log.push(Message::new(sender, text));
        let replay = (sender == Sender::Ai).then_some(ReplayHandle(index));

        self.view.render_message(&Entry {
            index,
            sender,
            text,
            replay,
        });
    }

    /// Send user text and append the AI reply (or the fallback message)
    pub async fn send_message(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        self.add_message(Sender::User, text);
        self.view.clear_input();

        match self.backend.generate_response(text, &self.session).await {
            Ok(reply) => {
                tracing::debug!(session = %self.session, chars = reply.len(), "received reply");
                self.add_message(Sender::Ai, &reply);
                self.speech.speak(&reply);
            }
            Err(e) => {
                tracing::error!(error = %e, session = %self.session, "failed to get reply");
                self.add_message(Sender::Ai, SEND_FALLBACK_MESSAGE);
            }
        }
    }

    /// Request a report on the whole conversation, then reset on success
    pub async fn generate_report(&mut self) {
        let transcript = self.log.transcript();

        match self
            .backend
            .conversation_report(&transcript, &self.session)
            .await
        {
            Ok(report) => {
                self.view.show_report(&report);
                self.log.clear();
                self.view.clear_history();
                self.session = SessionId::generate();
                tracing::info!(session = %self.session, "conversation reset after report");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to generate report");
                self.view.alert(REPORT_ERROR_MESSAGE);
            }
        }
    }

    /// Speak an AI entry again; other entries are ignored
    pub fn replay(&mut self, handle: ReplayHandle) {
        match self.log.get(handle.0) {
            Some(message) if message.sender == Sender::Ai => {
                let text = message.text.clone();
                self.speech.speak(&text);
            }
            _ => tracing::debug!(index = handle.0, "nothing to replay"),
        }
    }
}
