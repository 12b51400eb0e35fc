//! Google Gemini `generateContent` client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::{Error, Result};

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini model client
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiModel {
    /// Create a client for `model` at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: SecretString, base_url: &str, model: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Concatenate the text parts of the first candidate
fn first_candidate_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    Some(text)
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "calling Gemini");

        let request = GenerateContentRequest {
            contents: [Content {
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // the URL carries the API key
                let e = e.without_url();
                tracing::error!(error = %e, "Gemini request failed");
                Error::Model(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Model(format!("Gemini API error {status}: {body}")));
        }

        let result: GenerateContentResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            tracing::error!(error = %e, "failed to parse Gemini response");
            Error::Model(e.to_string())
        })?;

        first_candidate_text(result)
            .ok_or_else(|| Error::Model("Gemini returned no candidates".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shape() {
        let request = GenerateContentRequest {
            contents: [Content {
                parts: [RequestPart { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn joins_first_candidate_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"there"}]}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(response).as_deref(), Some("Hello there"));
    }

    #[test]
    fn missing_candidates_yield_none() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(first_candidate_text(response).is_none());
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = GeminiModel::new(
            SecretString::from(String::new()),
            "https://example.com",
            "gemini-1.5-flash".to_string(),
        );
        assert!(result.is_err());
    }
}
