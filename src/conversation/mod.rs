//! Conversation log and controller
//!
//! The log is the single ordered record of the conversation; views render
//! from it and reports are serialized from it.

mod controller;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use controller::{ConversationController, REPORT_ERROR_MESSAGE, SEND_FALLBACK_MESSAGE};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// The person practising
    User,
    /// The AI conversation partner
    #[serde(rename = "AI")]
    Ai,
}

impl Sender {
    /// Display name used in transcripts and prompts
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Ai => "AI",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    #[must_use]
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sender, self.text)
    }
}

/// Append-only ordered conversation log
///
/// Messages are only ever appended; the whole log is dropped on reset.
#[derive(Debug, Default, Clone)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Append a message and return its index
    pub fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Render the log as newline-separated `Sender: text` lines in order
    #[must_use]
    pub fn transcript(&self) -> String {
        render_transcript(&self.messages)
    }
}

/// Render messages as newline-separated `Sender: text` lines
#[must_use]
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
