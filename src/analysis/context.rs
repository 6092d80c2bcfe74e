use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use super::{decode_response, lenient};
use crate::error::PipelineError;
use crate::model::ConversationContext;
use crate::providers::{prompt, LlmProvider};

#[derive(Debug, Default, Deserialize)]
struct ContextResponse {
    #[serde(default, deserialize_with = "lenient")]
    is_first_message: bool,
    #[serde(default, deserialize_with = "lenient")]
    previous_topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    recent_changes: Vec<String>,
    #[serde(default, deserialize_with = "lenient")]
    tone: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    greeting_needed: bool,
}

impl From<ContextResponse> for ConversationContext {
    fn from(response: ContextResponse) -> Self {
        ConversationContext {
            is_first_message: response.is_first_message,
            previous_topics: response.previous_topics,
            recent_changes: response.recent_changes,
            tone: response
                .tone
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "friendly".to_string()),
            greeting_needed: response.greeting_needed,
        }
    }
}

/// Summarises the conversation so far
pub struct ContextAnalyzer {
    provider: Arc<dyn LlmProvider>,
}

impl ContextAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// A blank history is a first message and needs no service call
    pub async fn analyze(&self, history: &str) -> Result<ConversationContext, PipelineError> {
        if history.trim().is_empty() {
            debug!("Empty history, treating as first message");
            return Ok(ConversationContext::first_message());
        }

        let response = self
            .provider
            .generate(&prompt::context_request(history))
            .await?;
        Ok(decode_response::<ContextResponse>(response).into())
    }

    /// What to assume about a non-empty conversation when analysis is unavailable
    pub fn fallback_context() -> ConversationContext {
        ContextResponse::default().into()
    }
}
