//! Presentation surface
//!
//! Components never touch the terminal (or any other surface) directly; they
//! go through a [`View`]. Views render from the conversation log and the
//! adapter state, never the other way round.

mod terminal;

pub use terminal::TerminalView;

use crate::conversation::Sender;

/// Handle that re-invokes speech output for an AI entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayHandle(pub usize);

/// A rendered conversation entry
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    /// Position in the conversation log
    pub index: usize,
    pub sender: Sender,
    pub text: &'a str,
    /// Present only for AI-authored entries
    pub replay: Option<ReplayHandle>,
}

/// Everything the chat components need from the presentation layer
pub trait View: Send + Sync {
    /// Append an entry to the visible history and scroll it into view
    fn render_message(&self, entry: &Entry<'_>);

    /// Remove every entry from the visible history
    fn clear_history(&self);

    /// Clear the input box
    fn clear_input(&self);

    /// Replace the input box contents (used for recognized transcripts)
    fn set_input(&self, text: &str);

    /// Show a conversation report in the report panel
    fn show_report(&self, report: &str);

    /// Reflect the recognition state on the voice toggle
    fn set_listening(&self, listening: bool);

    /// Start or stop the avatar's mouth animation
    fn set_speaking(&self, speaking: bool);

    /// Blocking, user-facing notice
    fn alert(&self, message: &str);

    /// Ready for the next line of input
    fn prompt(&self) {}
}
