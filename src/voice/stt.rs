//! Recognizer backed by a recorder command and a Whisper-compatible API

use std::io::ErrorKind;

use secrecy::{ExposeSecret, SecretString};
use tokio::process::Command;
use tokio::task::JoinHandle;

use super::input::{
    PassSender, RecognitionError, RecognitionEvent, RecognitionResult, RecognitionSettings,
    Recognizer,
};
use crate::{Error, Result};

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Records one clip per pass and transcribes it over HTTP
pub struct HttpRecognizer {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
    record_command: Vec<String>,
    task: Option<JoinHandle<()>>,
}

impl HttpRecognizer {
    /// Create a recognizer
    ///
    /// # Errors
    ///
    /// Returns error if the recorder command is empty
    pub fn new(
        api_key: SecretString,
        url: String,
        model: String,
        record_command: Vec<String>,
    ) -> Result<Self> {
        if record_command.is_empty() {
            return Err(Error::Config("recorder command is empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            url,
            model,
            record_command,
            task: None,
        })
    }
}

impl Recognizer for HttpRecognizer {
    fn start(
        &mut self,
        settings: &RecognitionSettings,
        events: PassSender,
    ) -> std::result::Result<(), RecognitionError> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            tracing::error!(error = %e, "no async runtime for recognition");
            RecognitionError::StartFailed
        })?;

        self.stop();

        let pass = Pass {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            url: self.url.clone(),
            model: self.model.clone(),
            lang: settings.lang.clone(),
            record_command: self.record_command.clone(),
        };

        self.task = Some(handle.spawn(async move {
            let event = match pass.run().await {
                Ok(transcript) => RecognitionEvent::Result(vec![RecognitionResult::single(transcript)]),
                Err(e) => RecognitionEvent::Error(e.code().to_string()),
            };
            if !(events.send(event) && events.send(RecognitionEvent::End)) {
                tracing::debug!(pass = events.pass(), "recognition adapter gone");
            }
        }));

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HttpRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything one recognition pass needs, detached from the recognizer
struct Pass {
    client: reqwest::Client,
    api_key: SecretString,
    url: String,
    model: String,
    lang: String,
    record_command: Vec<String>,
}

impl Pass {
    async fn run(self) -> std::result::Result<String, RecognitionError> {
        let audio = self.record().await?;
        let transcript = self.transcribe(audio).await?;

        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            return Err(RecognitionError::NoSpeech);
        }
        Ok(transcript)
    }

    async fn record(&self) -> std::result::Result<Vec<u8>, RecognitionError> {
        let (program, args) = self
            .record_command
            .split_first()
            .ok_or(RecognitionError::StartFailed)?;

        tracing::debug!(program = %program, "recording clip");

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, program = %program, "failed to run recorder");
                match e.kind() {
                    ErrorKind::PermissionDenied => RecognitionError::NotAllowed,
                    _ => RecognitionError::Other("audio-capture".to_string()),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = %output.status, stderr = %stderr, "recorder failed");
            return Err(RecognitionError::Other("audio-capture".to_string()));
        }

        if output.stdout.is_empty() {
            return Err(RecognitionError::NoSpeech);
        }

        Ok(output.stdout)
    }

    async fn transcribe(&self, audio: Vec<u8>) -> std::result::Result<String, RecognitionError> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|_| RecognitionError::StartFailed)?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        if let Some(language) = whisper_language(&self.lang) {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                RecognitionError::Network
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(RecognitionError::ServiceNotAllowed);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(RecognitionError::Other(format!("http-{}", status.as_u16())));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            RecognitionError::Network
        })?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }
}

/// ISO-639-1 prefix of a locale (`en-US` -> `en`); `None` lets Whisper detect it
fn whisper_language(lang: &str) -> Option<&str> {
    lang.split(['-', '_'])
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_is_locale_prefix() {
        assert_eq!(whisper_language("en-US"), Some("en"));
        assert_eq!(whisper_language("pt_BR"), Some("pt"));
        assert_eq!(whisper_language("fr"), Some("fr"));
    }

    #[test]
    fn empty_locale_omits_language() {
        assert_eq!(whisper_language(""), None);
        assert_eq!(whisper_language("-US"), None);
        assert_eq!(whisper_language("  "), None);
    }

    #[test]
    fn empty_recorder_command_is_rejected() {
        let result = HttpRecognizer::new(
            SecretString::from("sk-test".to_string()),
            "http://127.0.0.1:1/v1/audio/transcriptions".to_string(),
            "whisper-1".to_string(),
            Vec::new(),
        );
        assert!(result.is_err());
    }
}
