//! Language model access and prompt construction for the backend service

mod gemini;

use async_trait::async_trait;

pub use gemini::GeminiModel;

use crate::Result;

/// Generates text from a single prompt
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Prompt asking the model to continue the conversation
#[must_use]
pub fn conversation_prompt(history: &str) -> String {
    format!(
        "Continue the conversation naturally by responding to the user and asking \
         a follow-up question to keep the discussion interesting. Try to know about the person\n\n\
         Conversation so far:\n{history}\n\n\
         AI:"
    )
}

/// Prompt asking the model for a language-skills report
#[must_use]
pub fn report_prompt(conversation_text: &str) -> String {
    format!(
        "Analyze the following conversation for the user's English and grammar skills. \
         Provide Simple feedback on their grammar, vocabulary, and fluency, and suggest not more than 30 words \
         specific areas for improvement:\n\n\
         {conversation_text}\n\n\
         Simple Report:"
    )
}
