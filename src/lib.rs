pub mod analysis;
pub mod builder;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fetchers;
pub mod model;
pub mod normalize;
pub mod pipelines;
pub mod profiles;
pub mod providers;
pub mod tables;
pub mod validators;

use std::sync::Arc;
use std::time::Duration;

pub use builder::{RecipeGuard, RecipeGuardBuilder};
pub use config::AppConfig;
pub use error::{GenerationError, PipelineError};
pub use extractors::{ExtractionResult, ExtractionStrategy};
pub use model::{
    AllergyKey, ApplianceKey, ConversationContext, Intent, IntentKind, RecipeDraft, UserProfile,
    ValidationResult, Violation, ViolationKind,
};
pub use pipelines::orchestrator::ProcessOutcome;
pub use pipelines::repair::{RepairOutcome, MAX_REPAIR_ITERATIONS};
pub use profiles::{ProfileStore, StaticProfileStore};
pub use providers::{AnthropicProvider, FallbackProvider, LlmProvider, OpenAIProvider};
pub use tables::RuleTables;

use fetchers::RequestFetcher;
use validators::ValidationInput;

/// Fetch a page and extract its recipe without any text generation
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let recipe = recipe_guard::extract_recipe_from_url("https://example.com/recipe", None).await?;
/// println!("{} ({} ingredients)", recipe.title, recipe.ingredients.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_recipe_from_url(
    url: &str,
    timeout: Option<Duration>,
) -> Result<ExtractionResult, PipelineError> {
    let fetcher = RequestFetcher::new(timeout)?;
    extractors::extract_from_url(&fetcher, url).await
}

/// Check a draft against every rule using the built-in tables
pub async fn validate_recipe(
    draft: &RecipeDraft,
    profile: &UserProfile,
    requested_ingredients: &[String],
) -> Vec<Violation> {
    let input = Arc::new(ValidationInput {
        draft: draft.clone(),
        profile: profile.clone(),
        requested_ingredients: requested_ingredients.to_vec(),
        tables: Arc::new(RuleTables::standard()),
    });
    validators::aggregate(&validators::run_all(input).await)
}
