//! Pipeline entry point: classify, route, produce a draft, repair it.

use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::repair::RepairLoop;
use super::{ingredient_names, request_recipe};
use crate::analysis::{ContextAnalyzer, IntentClassifier};
use crate::error::PipelineError;
use crate::extractors::{self, ExtractionStrategy};
use crate::fetchers::Fetcher;
use crate::model::{ConversationContext, Intent, IntentKind, RecipeDraft, UserProfile, Violation};
use crate::normalize::find_first_url;
use crate::providers::{prompt, GenerationRequest, LlmProvider};
use crate::tables::RuleTables;

pub const PASTE_RECIPE_MESSAGE: &str =
    "I couldn't read a recipe from that link. Could you paste the recipe text here instead?";

/// What one pipeline run hands back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessOutcome {
    /// The final draft, or `None` when the turn produced no recipe
    pub recipe: Option<RecipeDraft>,
    /// Rules the recipe still breaks. Never silently dropped.
    pub violations: Vec<Violation>,
    pub message: String,
    pub intent: Intent,
    pub context: ConversationContext,
    pub repair_iterations: usize,
    /// Set when the recipe came from a web page
    pub extraction_strategy: Option<ExtractionStrategy>,
}

/// A draft on its way into the repair loop
struct Produced {
    draft: RecipeDraft,
    requested: Vec<String>,
    strategy: Option<ExtractionStrategy>,
}

enum Routed {
    Draft(Produced),
    /// Text reply; the current recipe, if any, is re-checked but left as is
    Reply(String),
    /// Nothing to show but a message
    NoRecipe(String),
}

pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    fetcher: Arc<dyn Fetcher>,
    classifier: IntentClassifier,
    analyzer: ContextAnalyzer,
    repair: RepairLoop,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        fetcher: Arc<dyn Fetcher>,
        tables: Arc<RuleTables>,
    ) -> Self {
        Orchestrator {
            classifier: IntentClassifier::new(Arc::clone(&provider)),
            analyzer: ContextAnalyzer::new(Arc::clone(&provider)),
            repair: RepairLoop::new(Arc::clone(&provider), tables),
            provider,
            fetcher,
        }
    }

    pub fn repair_loop(&self) -> &RepairLoop {
        &self.repair
    }

    /// Handle one user turn.
    ///
    /// Errors are limited to blank input, a link intent without a usable URL,
    /// and generation failures outside the repair loop. A page that cannot be
    /// fetched or read yields no recipe and a request to paste the text.
    pub async fn process(
        &self,
        user_message: &str,
        history: &str,
        current_recipe: Option<&RecipeDraft>,
        profile: &UserProfile,
    ) -> Result<ProcessOutcome, PipelineError> {
        if user_message.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "message cannot be blank".to_string(),
            ));
        }
        let current_recipe = current_recipe.filter(|r| !r.is_empty());

        let (intent, context) = tokio::join!(
            self.classifier.classify(user_message, history, current_recipe),
            self.analyzer.analyze(history),
        );
        let intent = intent?;
        let context = context.unwrap_or_else(|e| {
            warn!("Context analysis failed, using defaults: {}", e);
            ContextAnalyzer::fallback_context()
        });

        let routed = self
            .route(&intent, user_message, history, current_recipe, profile)
            .await?;

        let outcome = match routed {
            Routed::Draft(produced) => {
                let repaired = self
                    .repair
                    .run(produced.draft, profile, &produced.requested)
                    .await;
                let message = compose_message(&context, &repaired.draft, &repaired.violations);
                ProcessOutcome {
                    recipe: Some(repaired.draft),
                    violations: repaired.violations,
                    message,
                    intent,
                    context,
                    repair_iterations: repaired.iterations,
                    extraction_strategy: produced.strategy,
                }
            }
            Routed::Reply(answer) => {
                // the recipe was accepted as it stands, so its ingredients count as requested
                let violations = match current_recipe {
                    Some(recipe) => {
                        let requested = ingredient_names(&recipe.ingredients);
                        self.repair.validate(recipe, profile, &requested).await
                    }
                    None => Vec::new(),
                };
                ProcessOutcome {
                    recipe: current_recipe.cloned(),
                    violations,
                    message: answer,
                    intent,
                    context,
                    repair_iterations: 0,
                    extraction_strategy: None,
                }
            }
            Routed::NoRecipe(message) => ProcessOutcome {
                recipe: None,
                violations: Vec::new(),
                message,
                intent,
                context,
                repair_iterations: 0,
                extraction_strategy: None,
            },
        };

        info!(
            "Handled {} turn: recipe={}, {} open violation(s)",
            outcome.intent.kind,
            outcome.recipe.is_some(),
            outcome.violations.len()
        );
        Ok(outcome)
    }

    async fn route(
        &self,
        intent: &Intent,
        message: &str,
        history: &str,
        current_recipe: Option<&RecipeDraft>,
        profile: &UserProfile,
    ) -> Result<Routed, PipelineError> {
        match intent.kind {
            IntentKind::FirstMessageLink => {
                let url = if intent.detected_url.is_empty() {
                    find_first_url(message).unwrap_or_default()
                } else {
                    intent.detected_url.clone()
                };
                self.from_link(&url, profile).await
            }
            IntentKind::FirstMessageCompleteRecipe => {
                let (draft, requested) =
                    request_recipe(self.provider.as_ref(), &prompt::structure_request(message, profile))
                        .await?;
                let requested = with_ingredient_names(requested, &draft);
                Ok(Routed::Draft(Produced {
                    draft,
                    requested,
                    strategy: None,
                }))
            }
            IntentKind::FirstMessageFreeText | IntentKind::FirstMessageQuery => {
                self.generate(&prompt::generate_request(message, profile)).await
            }
            IntentKind::Modification => match current_recipe {
                Some(recipe) => {
                    let accepted = ingredient_names(&recipe.ingredients);
                    self.generate(&prompt::modify_request(recipe, message, &accepted, profile))
                        .await
                }
                None => self.generate(&prompt::generate_request(message, profile)).await,
            },
            IntentKind::Question | IntentKind::Clarification => {
                let request = prompt::answer_request(message, history, current_recipe, profile);
                let response = self.provider.generate(&request).await?;
                Ok(Routed::Reply(answer_text(&response)))
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Routed, PipelineError> {
        let (draft, requested) = request_recipe(self.provider.as_ref(), request).await?;
        Ok(Routed::Draft(Produced {
            draft,
            requested,
            strategy: None,
        }))
    }

    /// Fetch, extract, then let the service structure the extracted text.
    /// If structuring fails the raw extraction goes into the repair loop.
    async fn from_link(&self, url: &str, profile: &UserProfile) -> Result<Routed, PipelineError> {
        let extraction = match extractors::extract_from_url(self.fetcher.as_ref(), url).await {
            Ok(extraction) => extraction,
            Err(PipelineError::Extraction(reason)) => {
                warn!("Extraction from {} failed: {}", url, reason);
                return Ok(Routed::NoRecipe(PASTE_RECIPE_MESSAGE.to_string()));
            }
            Err(e) => return Err(e),
        };
        let strategy = Some(extraction.strategy);

        let request = prompt::structure_request(&extraction.to_source_text(), profile);
        let (draft, requested) = match request_recipe(self.provider.as_ref(), &request).await {
            Ok(structured) => structured,
            Err(e) => {
                warn!("Structuring the extracted recipe failed, using it as extracted: {}", e);
                (extraction.into_draft(), Vec::new())
            }
        };

        let requested = with_ingredient_names(requested, &draft);
        Ok(Routed::Draft(Produced {
            draft,
            requested,
            strategy,
        }))
    }
}

/// For pasted and linked recipes every ingredient counts as requested, on
/// top of whatever the service listed
fn with_ingredient_names(mut requested: Vec<String>, draft: &RecipeDraft) -> Vec<String> {
    for name in ingredient_names(&draft.ingredients) {
        if !requested.iter().any(|r| r.eq_ignore_ascii_case(&name)) {
            requested.push(name);
        }
    }
    requested
}

fn answer_text(response: &Value) -> String {
    response["answer"]
        .as_str()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or("Sorry, I don't have an answer for that yet.")
        .to_string()
}

fn compose_message(
    context: &ConversationContext,
    draft: &RecipeDraft,
    violations: &[Violation],
) -> String {
    let mut message = String::new();
    if context.greeting_needed {
        message.push_str("Hi! ");
    }

    if violations.is_empty() {
        message.push_str(&format!("Here is your recipe for {}.", draft.title));
    } else {
        message.push_str(&format!(
            "Here is your recipe for {}, but {} issue(s) could not be fixed automatically:",
            draft.title,
            violations.len()
        ));
        for violation in violations {
            message.push_str(&format!("\n- {}", violation.message));
        }
    }
    message
}
