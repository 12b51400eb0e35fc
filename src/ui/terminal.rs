//! Line-oriented terminal view

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Entry, View};

/// Renders the conversation on stdout and alerts on stderr
#[derive(Debug, Default)]
pub struct TerminalView {
    out: Mutex<()>,
}

impl TerminalView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, text: &str, newline: bool) {
        let _guard = self.lock();
        let mut stdout = std::io::stdout().lock();
        let written = if newline {
            writeln!(stdout, "{text}")
        } else {
            write!(stdout, "{text}")
        };
        if let Err(e) = written.and_then(|()| stdout.flush()) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }

    fn write_line(&self, line: &str) {
        self.write(line, true);
    }
}

impl View for TerminalView {
    fn render_message(&self, entry: &Entry<'_>) {
        let line = match entry.replay {
            Some(handle) => format!(
                "[{}] {}: {}  (/replay {})",
                entry.index, entry.sender, entry.text, handle.0
            ),
            None => format!("[{}] {}: {}", entry.index, entry.sender, entry.text),
        };
        self.write_line(&line);
    }

    fn clear_history(&self) {
        self.write_line("--- conversation cleared ---");
    }

    fn clear_input(&self) {}

    fn set_input(&self, text: &str) {
        self.write_line(&format!("> {text}"));
    }

    fn show_report(&self, report: &str) {
        self.write_line("=== Conversation report ===");
        self.write_line(report);
        self.write_line("===========================");
    }

    fn set_listening(&self, listening: bool) {
        if listening {
            self.write_line("(listening... /listen again to stop)");
        }
    }

    fn set_speaking(&self, speaking: bool) {
        // open mouth while the AI talks, closed once it stops
        self.write_line(if speaking { "(:o) speaking..." } else { "(:|)" });
    }

    fn alert(&self, message: &str) {
        let _guard = self.lock();
        eprintln!("! {message}");
    }

    fn prompt(&self) {
        self.write("> ", false);
    }
}
