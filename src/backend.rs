//! Client for the conversation backend

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::{Error, Result};

/// Path of the reply-generation endpoint
pub const GENERATE_RESPONSE_PATH: &str = "/api/generate-response";

/// Path of the report endpoint
pub const CONVERSATION_REPORT_PATH: &str = "/api/conversation-report";

/// Body of a reply-generation request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub user_input: &'a str,
    pub session_id: &'a str,
}

/// Body of a report request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest<'a> {
    pub conversation_text: &'a str,
    /// Session the report closes, so the backend can forget it
    pub session_id: &'a str,
}

/// Successful response shape shared by both endpoints
#[derive(Debug, Deserialize)]
struct TextResponse {
    text: String,
}

/// Network round-trips the conversation controller depends on
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask the backend for the AI reply to `user_input`
    async fn generate_response(&self, user_input: &str, session_id: &SessionId) -> Result<String>;

    /// Ask the backend for a report on the whole conversation
    async fn conversation_report(
        &self,
        conversation_text: &str,
        session_id: &SessionId,
    ) -> Result<String>;
}

/// `ChatBackend` over HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a backend client for `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<String> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(url = %url, "posting to backend");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "backend request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "backend returned error status");
            return Err(Error::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let result: TextResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse backend response");
            e
        })?;

        Ok(result.text)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn generate_response(&self, user_input: &str, session_id: &SessionId) -> Result<String> {
        let request = GenerateRequest {
            user_input,
            session_id: session_id.as_str(),
        };
        self.post(GENERATE_RESPONSE_PATH, &request).await
    }

    async fn conversation_report(
        &self,
        conversation_text: &str,
        session_id: &SessionId,
    ) -> Result<String> {
        let request = ReportRequest {
            conversation_text,
            session_id: session_id.as_str(),
        };
        self.post(CONVERSATION_REPORT_PATH, &request).await
    }
}
