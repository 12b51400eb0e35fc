//! Synthesizer driving an external TTS program (`espeak-ng` style flags)

use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::output::{SynthesisEvent, SynthesisEventKind, Synthesizer, Utterance, Voice};
use crate::{Error, Result};

/// Words per minute at rate 1.0
const BASE_WORDS_PER_MINUTE: f32 = 175.0;

/// Pitch value at pitch 1.0 (program range 0-99)
const BASE_PITCH: f32 = 50.0;

/// Speaks utterances by spawning one program invocation each
pub struct CommandSynthesizer {
    program: String,
    voices: Vec<Voice>,
    task: Option<JoinHandle<()>>,
}

impl CommandSynthesizer {
    /// Create a synthesizer around `program` with a known voice list
    ///
    /// # Errors
    ///
    /// Returns error if the program name is empty
    pub fn new(program: String, voices: Vec<Voice>) -> Result<Self> {
        if program.trim().is_empty() {
            return Err(Error::Config("synthesis program is empty".to_string()));
        }

        Ok(Self {
            program,
            voices,
            task: None,
        })
    }
}

/// Command-line arguments for an utterance
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn command_args(utterance: &Utterance) -> Vec<String> {
    let wpm = (BASE_WORDS_PER_MINUTE * utterance.rate).round().max(1.0) as u32;
    let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;

    let mut args = vec![
        "-s".to_string(),
        wpm.to_string(),
        "-p".to_string(),
        pitch.to_string(),
    ];
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.engine_id().to_string());
    }
    args.push("--".to_string());
    args.push(utterance.text.clone());
    args
}

impl Synthesizer for CommandSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(
        &mut self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<SynthesisEvent>,
    ) -> Result<()> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Synthesis(format!("no async runtime: {e}")))?;

        let mut command = Command::new(&self.program);
        command.args(command_args(&utterance)).kill_on_drop(true);

        let id = utterance.id;
        let program = self.program.clone();

        self.task = Some(handle.spawn(async move {
            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    tracing::error!(error = %e, program = %program, "failed to start synthesizer");
                    let _ = events.send(SynthesisEvent {
                        utterance: id,
                        kind: SynthesisEventKind::End,
                    });
                    return;
                }
            };

            let _ = events.send(SynthesisEvent {
                utterance: id,
                kind: SynthesisEventKind::Start,
            });

            match child.wait().await {
                Ok(status) if !status.success() => {
                    tracing::warn!(status = %status, "synthesizer exited with error");
                }
                Err(e) => tracing::warn!(error = %e, "failed waiting for synthesizer"),
                Ok(_) => {}
            }

            let _ = events.send(SynthesisEvent {
                utterance: id,
                kind: SynthesisEventKind::End,
            });
        }));

        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            // dropping the child inside the task kills the process
            task.abort();
        }
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}
