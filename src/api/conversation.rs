//! Reply generation and conversation report endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::backend::{CONVERSATION_REPORT_PATH, GENERATE_RESPONSE_PATH};
use crate::conversation::{Sender, render_transcript};
use crate::model::{conversation_prompt, report_prompt};

/// Session used when the client sends none
pub const DEFAULT_SESSION_ID: &str = "default";

/// Reply text returned alongside a generation failure
pub const GENERATE_FAILURE_TEXT: &str =
    "I'm sorry, but I'm having trouble generating a response right now.";

/// Report text returned alongside a report failure
pub const REPORT_FAILURE_TEXT: &str = "Unable to generate conversation report at this time.";

/// Build conversation router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(GENERATE_RESPONSE_PATH, post(generate_response))
        .route(CONVERSATION_REPORT_PATH, post(conversation_report))
        .with_state(state)
}

/// Reply generation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponseRequest {
    #[serde(default)]
    pub user_input: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

/// Reply generation response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponseBody {
    pub text: String,
    pub session_id: String,
}

/// Report request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReportRequest {
    #[serde(default)]
    pub conversation_text: String,
    /// Session to forget once the report is produced
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Report response
#[derive(Debug, Serialize)]
pub struct ConversationReportBody {
    pub text: String,
}

/// Generate the AI reply for a user turn
async fn generate_response(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<GenerateResponseRequest>,
) -> Result<Json<GenerateResponseBody>, ConversationError> {
    let session_id = request.session_id;

    state
        .history
        .add_message(&session_id, Sender::User, &request.user_input)
        .await;

    let history = render_transcript(&state.history.conversation(&session_id).await);
    let prompt = conversation_prompt(&history);

    let reply = state
        .model
        .generate(&prompt)
        .await
        .map_err(|e| ConversationError::GenerationFailed(e.to_string()))?;
    let reply = reply.trim().to_string();

    state
        .history
        .add_message(&session_id, Sender::Ai, &reply)
        .await;

    tracing::debug!(session = %session_id, chars = reply.len(), "generated reply");

    Ok(Json(GenerateResponseBody {
        text: reply,
        session_id,
    }))
}

/// Produce a language-skills report for a finished conversation
async fn conversation_report(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ConversationReportRequest>,
) -> Result<Json<ConversationReportBody>, ConversationError> {
    let prompt = report_prompt(&request.conversation_text);

    let report = state
        .model
        .generate(&prompt)
        .await
        .map_err(|e| ConversationError::ReportFailed(e.to_string()))?;

    tracing::debug!(chars = report.len(), "generated conversation report");

    // the client starts a new session after a report
    if let Some(session_id) = request.session_id {
        state.history.clear(&session_id).await;
        let active_sessions = state.history.session_count().await;
        tracing::debug!(session = %session_id, active_sessions, "session history released");
    }

    Ok(Json(ConversationReportBody {
        text: report.trim().to_string(),
    }))
}

/// Conversation endpoint errors
#[derive(Debug)]
pub enum ConversationError {
    GenerationFailed(String),
    ReportFailed(String),
}

impl IntoResponse for ConversationError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            text: &'static str,
        }

        let (error, text) = match self {
            Self::GenerationFailed(e) => (e, GENERATE_FAILURE_TEXT),
            Self::ReportFailed(e) => (e, REPORT_FAILURE_TEXT),
        };
        tracing::error!(error = %error, "conversation request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error, text }),
        )
            .into_response()
    }
}
