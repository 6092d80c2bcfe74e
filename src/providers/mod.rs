mod anthropic;
mod factory;
mod fallback;
mod open_ai;
pub mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::{ProviderFactory, ProviderKind};
pub use fallback::FallbackProvider;
pub use open_ai::OpenAIProvider;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GenerationError;

/// One structured-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// User-side content: the message, the draft, the violations
    pub prompt: String,
    /// Fixed instruction set for the task
    pub instructions: String,
    /// JSON schema the response object must follow
    pub output_schema: Value,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, instructions: impl Into<String>, output_schema: Value) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            instructions: instructions.into(),
            output_schema,
        }
    }
}

/// Unified trait for all text-generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Run the request and return the decoded JSON object
    async fn generate(&self, request: &GenerationRequest) -> Result<Value, GenerationError>;
}

/// Decode a model's text output into a JSON object.
///
/// Models sometimes wrap JSON in a markdown fence or add a sentence around it;
/// the outermost `{...}` is taken in that case.
pub(crate) fn parse_json_content(content: &str) -> Result<Value, GenerationError> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return into_object(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            into_object(serde_json::from_str(&trimmed[start..=end])?)
        }
        _ => Err(GenerationError::MalformedOutput(format!(
            "no JSON object in response: {}",
            truncate(trimmed, 200)
        ))),
    }
}

fn into_object(value: Value) -> Result<Value, GenerationError> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(GenerationError::MalformedOutput(format!(
            "expected a JSON object, got {value}"
        )))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let value = parse_json_content(r#"{"intent": "question"}"#).unwrap();
        assert_eq!(value["intent"], "question");
    }

    #[test]
    fn test_parse_fenced_json() {
        let content = "```json\n{\"title\": \"Soup\", \"ingredients\": []}\n```";
        let value = parse_json_content(content).unwrap();
        assert_eq!(value["title"], "Soup");
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            parse_json_content("[1, 2, 3]"),
            Err(GenerationError::MalformedOutput(_))
        ));
        assert!(parse_json_content("Sorry, I can't help with that").is_err());
    }
}
