//! Configuration management for Parley

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::voice::{RecognitionSettings, Voice};
use file::ParleyConfigFile;

/// Default backend the chat client talks to
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Default Whisper-compatible transcription endpoint
pub const DEFAULT_STT_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default Gemini API base URL
pub const DEFAULT_MODEL_URL: &str = "https://generativelanguage.googleapis.com";

/// Parley configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chat client configuration
    pub client: ClientConfig,

    /// Speech recognition configuration
    pub recognition: RecognitionConfig,

    /// Speech synthesis configuration
    pub synthesis: SynthesisConfig,

    /// Backend service configuration
    pub server: ServerConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Chat client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend_url: String,
    pub request_timeout: Duration,
}

/// Speech recognition configuration
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    pub enabled: bool,

    /// Recognition locale
    pub lang: String,

    /// Recorder command writing a WAV clip to stdout
    pub record_command: Vec<String>,

    pub stt_url: String,
    pub stt_model: String,
}

impl RecognitionConfig {
    /// Single-shot settings for the configured locale
    #[must_use]
    pub fn settings(&self) -> RecognitionSettings {
        RecognitionSettings::single_shot(self.lang.clone())
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct SynthesisConfig {
    pub enabled: bool,
    pub program: String,
    pub rate: f32,
    pub pitch: f32,
    pub voices: Vec<Voice>,
}

/// Backend service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,

    /// Directory with the widget page
    pub static_dir: Option<PathBuf>,

    /// Language model identifier
    pub model: String,

    /// Language model API base URL
    pub model_url: String,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (for transcription)
    pub openai: Option<SecretString>,

    /// Google Gemini API key (for the backend service)
    pub gemini: Option<SecretString>,
}

/// Default recorder: 5 s of 16 kHz mono WAV on stdout
fn default_record_command() -> Vec<String> {
    ["arecord", "-q", "-d", "5", "-f", "S16_LE", "-r", "16000", "-c", "1", "-t", "wav", "-"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(ParleyConfigFile::default(), false, &|_| None)
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    #[must_use]
    pub fn load() -> Self {
        Self::load_with_options(false)
    }

    /// Load configuration with explicit voice disable option
    #[must_use]
    pub fn load_with_options(disable_voice: bool) -> Self {
        let fc = file::load_config_file();

        if disable_voice {
            tracing::info!("voice explicitly disabled via --disable-voice");
        }

        Self::from_file(fc, disable_voice, &|key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    #[must_use]
    pub fn from_file(
        fc: ParleyConfigFile,
        disable_voice: bool,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Self {
        let client = ClientConfig {
            backend_url: env("PARLEY_BACKEND_URL")
                .or(fc.client.backend_url)
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            request_timeout: Duration::from_secs(
                env("PARLEY_REQUEST_TIMEOUT")
                    .and_then(|s| s.parse().ok())
                    .or(fc.client.request_timeout_secs)
                    .unwrap_or(30),
            ),
        };

        let recognition = RecognitionConfig {
            enabled: !disable_voice && fc.recognition.enabled.unwrap_or(true),
            lang: env("PARLEY_RECOGNITION_LANG")
                .or(fc.recognition.lang)
                .unwrap_or_else(|| "en-US".to_string()),
            record_command: fc
                .recognition
                .record_command
                .unwrap_or_else(default_record_command),
            stt_url: env("PARLEY_STT_URL")
                .or(fc.recognition.stt_url)
                .unwrap_or_else(|| DEFAULT_STT_URL.to_string()),
            stt_model: env("PARLEY_STT_MODEL")
                .or(fc.recognition.stt_model)
                .unwrap_or_else(|| "whisper-1".to_string()),
        };

        let synthesis = SynthesisConfig {
            enabled: !disable_voice && fc.synthesis.enabled.unwrap_or(true),
            program: env("PARLEY_TTS_PROGRAM")
                .or(fc.synthesis.program)
                .unwrap_or_else(|| "espeak-ng".to_string()),
            rate: fc.synthesis.rate.unwrap_or(1.0),
            pitch: fc.synthesis.pitch.unwrap_or(1.0),
            voices: fc.synthesis.voices.unwrap_or_default(),
        };

        let server = ServerConfig {
            port: env("PARLEY_PORT")
                .or_else(|| env("PORT"))
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(5000),
            static_dir: env("PARLEY_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            model: env("PARLEY_MODEL")
                .or(fc.server.model)
                .unwrap_or_else(|| "gemini-1.5-flash".to_string()),
            model_url: env("PARLEY_MODEL_URL")
                .or(fc.server.model_url)
                .unwrap_or_else(|| DEFAULT_MODEL_URL.to_string()),
        };

        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            gemini: env("GEMINI_API_KEY")
                .or(fc.api_keys.gemini)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        };

        Self {
            client,
            recognition,
            synthesis,
            server,
            api_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.client.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.client.request_timeout, Duration::from_secs(30));
        assert_eq!(config.recognition.lang, "en-US");
        assert_eq!(config.recognition.record_command[0], "arecord");
        assert_eq!(config.synthesis.program, "espeak-ng");
        assert!((config.synthesis.rate - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.model, "gemini-1.5-flash");
        assert!(config.api_keys.gemini.is_none());
    }

    #[test]
    fn env_overrides_file() {
        let mut fc = ParleyConfigFile::default();
        fc.client.backend_url = Some("http://file:1".to_string());
        fc.server.port = Some(7000);

        let env = env_of(&[("PARLEY_BACKEND_URL", "http://env:2"), ("PORT", "8080")]);
        let config = Config::from_file(fc, false, &env);

        assert_eq!(config.client.backend_url, "http://env:2");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn file_overrides_default() {
        let mut fc = ParleyConfigFile::default();
        fc.recognition.lang = Some("en-GB".to_string());
        fc.synthesis.voices = Some(vec![Voice::new("Serena Female", "en-GB")]);

        let config = Config::from_file(fc, false, &|_| None);

        assert_eq!(config.recognition.settings().lang, "en-GB");
        assert!(!config.recognition.settings().continuous);
        assert_eq!(config.synthesis.voices.len(), 1);
    }

    #[test]
    fn disable_voice_wins() {
        let mut fc = ParleyConfigFile::default();
        fc.synthesis.enabled = Some(true);

        let config = Config::from_file(fc, true, &|_| None);

        assert!(!config.recognition.enabled);
        assert!(!config.synthesis.enabled);
    }

    #[test]
    fn empty_keys_are_ignored() {
        let env = env_of(&[("GEMINI_API_KEY", ""), ("OPENAI_API_KEY", "sk-test")]);
        let config = Config::from_file(ParleyConfigFile::default(), false, &env);

        assert!(config.api_keys.gemini.is_none());
        assert!(config.api_keys.openai.is_some());
    }
}
