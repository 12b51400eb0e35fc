//! Parley - voice conversation practice with an AI partner
//!
//! This library provides both halves of Parley:
//! - The chat client: speech input/output adapters, an animated avatar,
//!   the conversation log and the controller that talks to the backend
//! - The backend service: reply generation and end-of-session language
//!   reports on top of a language model
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Chat client                      │
//! │  SpeechInput │ ConversationController │ SpeechOutput │
//! │              │   log · session · View │   Avatar     │
//! └────────────────────┬────────────────────────────────┘
//!                      │ POST /api/generate-response
//!                      │ POST /api/conversation-report
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Backend service                     │
//! │        SessionHistory │ prompts │ LanguageModel      │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod app;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod model;
pub mod session;
pub mod ui;
pub mod voice;

pub use api::{ApiServer, ApiState, SessionHistory};
pub use app::ChatApp;
pub use backend::{ChatBackend, HttpBackend};
pub use config::Config;
pub use conversation::{ConversationController, ConversationLog, Message, Sender};
pub use error::{Error, Result};
pub use model::{GeminiModel, LanguageModel};
pub use session::SessionId;
pub use ui::{Entry, ReplayHandle, TerminalView, View};
pub use voice::{SpeechInput, SpeechOutput};
