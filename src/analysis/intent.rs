use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;

use super::{decode_response, lenient};
use crate::error::PipelineError;
use crate::model::{Intent, IntentKind, RecipeDraft};
use crate::normalize::{contains_ci, find_first_url};
use crate::providers::{prompt, LlmProvider};

const DEFAULT_CONFIDENCE: f64 = 0.8;
const DEFAULT_REASONING: &str = "Classification completed";

/// "2 cups flour", "- 1 onion", "3. Bake"
static QUANTITY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•]\s*)?\d").expect("Valid regex pattern"));

static QUESTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:how|what|why|when|where|which|who|can|could|should|would|is|are|do|does|will)\b")
        .expect("Valid regex pattern")
});

#[derive(Debug, Default, Deserialize)]
struct IntentResponse {
    #[serde(default, deserialize_with = "lenient")]
    intent: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    detected_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    reasoning: Option<String>,
}

/// Where the conversation stands, which limits the labels that make sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// No history and no recipe
    FirstTurn,
    /// There is a recipe on the table
    HasRecipe,
    /// Some history but no recipe yet
    Open,
}

impl Stage {
    fn of(history: &str, recipe_state: Option<&RecipeDraft>) -> Self {
        let has_recipe = recipe_state.is_some_and(|r| !r.is_empty());
        if has_recipe {
            Stage::HasRecipe
        } else if history.trim().is_empty() {
            Stage::FirstTurn
        } else {
            Stage::Open
        }
    }

    fn allows(&self, kind: IntentKind) -> bool {
        match self {
            Stage::FirstTurn => kind.is_first_message(),
            Stage::HasRecipe => !kind.is_first_message(),
            Stage::Open => true,
        }
    }
}

fn looks_like_question(message: &str) -> bool {
    message.trim_end().ends_with('?') || QUESTION_START.is_match(message)
}

fn looks_like_complete_recipe(message: &str) -> bool {
    let has_sections = contains_ci(message, "ingredients")
        && ["instructions", "directions", "method", "steps", "preparation"]
            .iter()
            .any(|heading| contains_ci(message, heading));

    let lines: Vec<&str> = message.lines().filter(|l| !l.trim().is_empty()).collect();
    let quantity_lines = lines.iter().filter(|l| QUANTITY_LINE.is_match(l)).count();

    has_sections || (lines.len() >= 5 && quantity_lines >= 3)
}

/// Deterministic label used when the service answer is unusable
fn heuristic_kind(message: &str, stage: Stage) -> IntentKind {
    if stage == Stage::HasRecipe {
        return if looks_like_question(message) {
            IntentKind::Question
        } else {
            IntentKind::Modification
        };
    }

    if find_first_url(message).is_some() {
        IntentKind::FirstMessageLink
    } else if looks_like_complete_recipe(message) {
        IntentKind::FirstMessageCompleteRecipe
    } else if looks_like_question(message) {
        IntentKind::FirstMessageQuery
    } else {
        IntentKind::FirstMessageFreeText
    }
}

/// Turn a decoded service response into an [`Intent`] that honours the
/// first-message and has-recipe rules.
fn resolve(response: IntentResponse, message: &str, stage: Stage) -> Intent {
    let proposed = response
        .intent
        .as_deref()
        .and_then(|label| label.parse::<IntentKind>().ok());

    let kind = match proposed {
        Some(kind) if stage.allows(kind) => kind,
        other => {
            let fallback = heuristic_kind(message, stage);
            debug!(
                "Replacing intent {:?} with {} for stage {:?}",
                other, fallback, stage
            );
            fallback
        }
    };

    let confidence = match response.confidence {
        Some(c) if c.is_finite() && c > 0.0 => c.min(1.0),
        _ => DEFAULT_CONFIDENCE,
    };

    let detected_url = if kind == IntentKind::FirstMessageLink {
        find_first_url(message)
            .or(response.detected_url.filter(|u| !u.trim().is_empty()))
            .unwrap_or_default()
    } else {
        String::new()
    };

    let reasoning = response
        .reasoning
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REASONING.to_string());

    Intent {
        kind,
        confidence,
        detected_url,
        reasoning,
    }
}

/// Labels the user's latest message with one of the seven intents
pub struct IntentClassifier {
    provider: Arc<dyn LlmProvider>,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn classify(
        &self,
        message: &str,
        history: &str,
        recipe_state: Option<&RecipeDraft>,
    ) -> Result<Intent, PipelineError> {
        if message.trim().is_empty() {
            return Err(PipelineError::InvalidInput("message cannot be blank".to_string()));
        }

        let request = prompt::classify_request(message, history, recipe_state);
        let response = self.provider.generate(&request).await?;
        let intent = resolve(
            decode_response(response),
            message,
            Stage::of(history, recipe_state),
        );

        info!(
            "Classified message as {} (confidence {:.2})",
            intent.kind, intent.confidence
        );
        Ok(intent)
    }
}
