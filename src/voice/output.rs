//! Speech output: utterance lifecycle, voice selection and avatar

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::avatar::Avatar;
use crate::Result;
use crate::ui::View;

/// Shown once when no synthesizer is available
pub const SYNTHESIS_UNAVAILABLE_MESSAGE: &str =
    "Speech synthesis is not supported in this environment.";

/// Name fragments that mark a voice as female
const FEMALE_MARKERS: [&str; 2] = ["female", "woman"];

/// A synthesis voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    /// BCP 47 locale, e.g. `en-GB`
    pub lang: String,
    /// Engine-specific identifier, when it differs from the display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Voice {
    #[must_use]
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            id: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Identifier handed to the engine
    #[must_use]
    pub fn engine_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    fn is_female(&self) -> bool {
        let name = self.name.to_lowercase();
        FEMALE_MARKERS.iter().any(|m| name.contains(m))
    }
}

/// Pick a voice: female English, then any female, then platform default (`None`)
#[must_use]
pub fn select_voice(voices: &[Voice]) -> Option<&Voice> {
    let mut female = voices.iter().filter(|v| v.is_female()).peekable();
    let first = female.peek().copied();
    female.find(|v| v.lang.starts_with("en-")).or(first)
}

/// A single unit of text submitted for synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    /// `None` uses the platform default voice
    pub voice: Option<Voice>,
}

/// Utterance lifecycle notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisEventKind {
    Start,
    End,
}

/// Lifecycle notification for one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisEvent {
    pub utterance: u64,
    pub kind: SynthesisEventKind,
}

/// Platform speech-synthesis capability
pub trait Synthesizer: Send {
    /// Voices currently available
    fn voices(&self) -> Vec<Voice>;

    /// Queue an utterance; lifecycle events are sent on `events`
    ///
    /// # Errors
    ///
    /// Returns error if the engine rejects the utterance
    fn speak(
        &mut self,
        utterance: Utterance,
        events: mpsc::UnboundedSender<SynthesisEvent>,
    ) -> Result<()>;

    /// Stop anything currently speaking
    fn cancel(&mut self);
}

/// Wraps a [`Synthesizer`], keeping at most one utterance in flight
pub struct SpeechOutput {
    synthesizer: Option<Box<dyn Synthesizer>>,
    view: Arc<dyn View>,
    avatar: Avatar,
    rate: f32,
    pitch: f32,
    speaking: bool,
    in_flight: Option<u64>,
    next_id: u64,
    unavailable_reported: bool,
    events_tx: mpsc::UnboundedSender<SynthesisEvent>,
    events_rx: mpsc::UnboundedReceiver<SynthesisEvent>,
}

impl SpeechOutput {
    /// Create an adapter; `None` means the capability is unavailable
    #[must_use]
    pub fn new(synthesizer: Option<Box<dyn Synthesizer>>, view: Arc<dyn View>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            synthesizer,
            view,
            avatar: Avatar::new(),
            rate: 1.0,
            pitch: 1.0,
            speaking: false,
            in_flight: None,
            next_id: 0,
            unavailable_reported: false,
            events_tx,
            events_rx,
        }
    }

    /// Override the fixed rate and pitch
    #[must_use]
    pub const fn with_prosody(mut self, rate: f32, pitch: f32) -> Self {
        self.rate = rate;
        self.pitch = pitch;
        self
    }

    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.speaking
    }

    #[must_use]
    pub const fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    /// Speak `text`, cancelling whatever is in flight first
    pub fn speak(&mut self, text: &str) {
        if self.synthesizer.is_none() {
            if !self.unavailable_reported {
                self.unavailable_reported = true;
                self.view.alert(SYNTHESIS_UNAVAILABLE_MESSAGE);
            }
            return;
        }

        if self.in_flight.is_some() {
            self.cancel();
        }

        let Some(synthesizer) = self.synthesizer.as_mut() else {
            return;
        };

        let voices = synthesizer.voices();
        let voice = select_voice(&voices).cloned();

        self.next_id += 1;
        let utterance = Utterance {
            id: self.next_id,
            text: text.to_string(),
            rate: self.rate,
            pitch: self.pitch,
            voice,
        };
        let id = utterance.id;

        tracing::debug!(
            utterance = id,
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()),
            chars = text.len(),
            "speaking"
        );

        match synthesizer.speak(utterance, self.events_tx.clone()) {
            Ok(()) => self.in_flight = Some(id),
            Err(e) => tracing::warn!(error = %e, "synthesizer rejected utterance"),
        }
    }

    /// Stop the active utterance and the mouth animation. Idempotent
    pub fn cancel(&mut self) {
        if let Some(synthesizer) = self.synthesizer.as_mut() {
            synthesizer.cancel();
        }
        self.in_flight = None;
        self.set_speaking(false);
    }

    /// Wait for the next synthesizer event
    pub async fn next_event(&mut self) -> Option<SynthesisEvent> {
        self.events_rx.recv().await
    }

    /// Apply a synthesizer event; stale events are ignored
    pub fn handle_event(&mut self, event: SynthesisEvent) {
        if self.in_flight != Some(event.utterance) {
            tracing::trace!(utterance = event.utterance, "ignoring stale synthesis event");
            return;
        }

        match event.kind {
            SynthesisEventKind::Start => self.set_speaking(true),
            SynthesisEventKind::End => {
                self.in_flight = None;
                self.set_speaking(false);
            }
        }
    }

    /// Drive the avatar and tell the view, only on change
    fn set_speaking(&mut self, speaking: bool) {
        if self.speaking == speaking {
            return;
        }
        self.speaking = speaking;
        if speaking {
            self.avatar.begin();
        } else {
            self.avatar.end();
        }
        self.view.set_speaking(speaking);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voices(list: &[(&str, &str)]) -> Vec<Voice> {
        list.iter().map(|(n, l)| Voice::new(*n, *l)).collect()
    }

    #[test]
    fn prefers_female_english_voice() {
        let list = voices(&[("Amelie Woman", "fr-FR"), ("Serena Female", "en-GB")]);
        assert_eq!(select_voice(&list).unwrap().name, "Serena Female");
    }

    #[test]
    fn falls_back_to_first_female_voice() {
        let list = voices(&[("Daniel", "en-GB"), ("Amelie Woman", "fr-FR"), ("Anna Female", "de-DE")]);
        assert_eq!(select_voice(&list).unwrap().name, "Amelie Woman");
    }

    #[test]
    fn no_female_voice_uses_default() {
        let list = voices(&[("Daniel", "en-GB"), ("Thomas", "fr-FR")]);
        assert!(select_voice(&list).is_none());
        assert!(select_voice(&[]).is_none());
    }

    #[test]
    fn female_marker_is_case_insensitive() {
        let list = voices(&[("Microsoft FEMALE Voice", "en-US")]);
        assert!(select_voice(&list).is_some());
    }

    #[test]
    fn locale_must_be_regional_english() {
        // bare "en" is not an English locale match, the first female wins
        let list = voices(&[("A Woman", "es-ES"), ("B Female", "en")]);
        assert_eq!(select_voice(&list).unwrap().name, "A Woman");
    }
}
