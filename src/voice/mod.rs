//! Voice processing module
//!
//! Speech input and output adapters over pluggable platform capabilities,
//! plus the avatar animated while speech plays.

pub mod avatar;
mod input;
mod output;
mod stt;
mod tts;

pub use avatar::Avatar;
pub use input::{
    PassEvent, PassSender, RECOGNITION_UNAVAILABLE_MESSAGE, RecognitionAlternative,
    RecognitionError, RecognitionEvent, RecognitionResult, RecognitionSettings, Recognizer,
    SpeechInput,
};
pub use output::{
    SYNTHESIS_UNAVAILABLE_MESSAGE, SpeechOutput, SynthesisEvent, SynthesisEventKind, Synthesizer,
    Utterance, Voice, select_voice,
};
pub use stt::HttpRecognizer;
pub use tts::{CommandSynthesizer, command_args};
