//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::voice::Voice;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfigFile {
    /// Chat client configuration
    #[serde(default)]
    pub client: ClientFileConfig,

    /// Speech recognition configuration
    #[serde(default)]
    pub recognition: RecognitionFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub synthesis: SynthesisFileConfig,

    /// Backend service configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Chat client configuration
#[derive(Debug, Default, Deserialize)]
pub struct ClientFileConfig {
    /// Backend base URL
    pub backend_url: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Speech recognition configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecognitionFileConfig {
    pub enabled: Option<bool>,

    /// Recognition locale (e.g. "en-US")
    pub lang: Option<String>,

    /// Recorder command writing a WAV clip to stdout
    pub record_command: Option<Vec<String>>,

    /// Transcription endpoint
    pub stt_url: Option<String>,

    /// Transcription model (e.g. "whisper-1")
    pub stt_model: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisFileConfig {
    pub enabled: Option<bool>,

    /// TTS program (e.g. "espeak-ng")
    pub program: Option<String>,

    pub rate: Option<f32>,
    pub pitch: Option<f32>,

    /// Voices the program offers
    pub voices: Option<Vec<Voice>>,
}

/// Backend service configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    pub port: Option<u16>,

    /// Directory with the widget page
    pub static_dir: Option<String>,

    /// Language model identifier (e.g. "gemini-1.5-flash")
    pub model: Option<String>,

    /// Language model API base URL
    pub model_url: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub gemini: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ParleyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ParleyConfigFile {
    config_file_path().map_or_else(ParleyConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from `path`, falling back to defaults
pub fn load_config_file_from(path: &Path) -> ParleyConfigFile {
    if !path.exists() {
        return ParleyConfigFile::default();
    }

    match read_config_file(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "config file applied");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
            ParleyConfigFile::default()
        }
    }
}

fn read_config_file(path: &Path) -> crate::Result<ParleyConfigFile> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Return the config file path: `~/.config/parley/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config_file_from(Path::new("/nonexistent/parley/config.toml"));
        assert!(config.client.backend_url.is_none());
    }

    #[test]
    fn partial_file_is_overlaid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[client]
backend_url = "http://example.com:8080"

[synthesis]
program = "say"
voices = [{{ name = "Samantha Female", lang = "en-US" }}]
"#
        )
        .unwrap();

        let config = load_config_file_from(file.path());
        assert_eq!(config.client.backend_url.as_deref(), Some("http://example.com:8080"));
        assert_eq!(config.synthesis.program.as_deref(), Some("say"));
        assert_eq!(config.synthesis.voices.unwrap()[0].lang, "en-US");
        assert!(config.server.port.is_none());
    }

    #[test]
    fn invalid_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "client = 42 [[[").unwrap();

        let config = load_config_file_from(file.path());
        assert!(config.client.backend_url.is_none());
    }
}
