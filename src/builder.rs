use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::extractors::{self, ExtractionResult};
use crate::fetchers::{Fetcher, RequestFetcher};
use crate::model::{RecipeDraft, UserProfile, Violation};
use crate::pipelines::orchestrator::{Orchestrator, ProcessOutcome};
use crate::profiles::ProfileStore;
use crate::providers::{FallbackProvider, LlmProvider};
use crate::tables::RuleTables;

/// Builder for a configured [`RecipeGuard`]
///
/// Anything not set explicitly comes from the configuration: the provider
/// chain from `[providers]` and `[fallback]`, the fetcher timeout from
/// `timeout`.
#[derive(Default)]
pub struct RecipeGuardBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    tables: Option<Arc<RuleTables>>,
    timeout: Option<Duration>,
    config: Option<AppConfig>,
}

impl RecipeGuardBuilder {
    /// Use this text-generation provider instead of the configured chain
    ///
    /// # Example
    /// ```
    /// use recipe_guard::{OpenAIProvider, RecipeGuard};
    /// use std::sync::Arc;
    ///
    /// let builder = RecipeGuard::builder()
    ///     .provider(Arc::new(OpenAIProvider::with_api_key(
    ///         "sk-test".to_string(),
    ///         "gpt-4.1-mini".to_string(),
    ///     )));
    /// ```
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use this page fetcher instead of plain HTTP
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the built-in allergen, appliance, unit and diet tables
    pub fn tables(mut self, tables: RuleTables) -> Self {
        self.tables = Some(Arc::new(tables));
        self
    }

    /// Set a timeout for page fetches
    ///
    /// # Example
    /// ```
    /// use recipe_guard::RecipeGuard;
    /// use std::time::Duration;
    ///
    /// let builder = RecipeGuard::builder().timeout(Duration::from_secs(10));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Use an already loaded configuration instead of reading `config.toml`
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Assemble the pipeline
    ///
    /// # Errors
    /// Returns `PipelineError` if:
    /// - the configuration cannot be loaded
    /// - no provider is configured or has an API key
    /// - the HTTP client cannot be built
    pub fn build(self) -> Result<RecipeGuard, PipelineError> {
        let config = match (&self.provider, self.config) {
            (Some(_), config) => config,
            (None, Some(config)) => Some(config),
            (None, None) => Some(AppConfig::load()?),
        };

        let provider = match self.provider {
            Some(provider) => provider,
            None => {
                let config = config
                    .as_ref()
                    .ok_or_else(|| PipelineError::InvalidInput("no configuration".to_string()))?;
                Arc::new(FallbackProvider::new(config)?) as Arc<dyn LlmProvider>
            }
        };

        let timeout = self
            .timeout
            .or_else(|| config.as_ref().map(|c| Duration::from_secs(c.timeout)));
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(RequestFetcher::new(timeout)?) as Arc<dyn Fetcher>,
        };

        let tables = self
            .tables
            .unwrap_or_else(|| Arc::new(RuleTables::standard()));

        Ok(RecipeGuard {
            fetcher: Arc::clone(&fetcher),
            orchestrator: Orchestrator::new(provider, fetcher, tables),
        })
    }
}

/// Main entry point: one configured pipeline, reusable across turns
pub struct RecipeGuard {
    fetcher: Arc<dyn Fetcher>,
    orchestrator: Orchestrator,
}

impl RecipeGuard {
    /// Creates a new builder
    ///
    /// # Example
    /// ```
    /// use recipe_guard::RecipeGuard;
    ///
    /// let builder = RecipeGuard::builder();
    /// ```
    pub fn builder() -> RecipeGuardBuilder {
        RecipeGuardBuilder::default()
    }

    /// Build from a loaded configuration with the default fetcher and tables
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        Self::builder().config(config.clone()).build()
    }

    /// Handle one user turn
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_guard::{RecipeGuard, UserProfile};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let guard = RecipeGuard::builder().build()?;
    /// let profile = UserProfile::from_keys(["peanuts"], ["oven"], "vegetarian")?;
    /// let outcome = guard
    ///     .process("a quick weeknight curry", "", None, &profile)
    ///     .await?;
    /// println!("{}", outcome.message);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process(
        &self,
        user_message: &str,
        history: &str,
        current_recipe: Option<&RecipeDraft>,
        profile: &UserProfile,
    ) -> Result<ProcessOutcome, PipelineError> {
        self.orchestrator
            .process(user_message, history, current_recipe, profile)
            .await
    }

    /// Same as [`RecipeGuard::process`] with the profile looked up by user id
    pub async fn process_for_user(
        &self,
        store: &dyn ProfileStore,
        user_id: &str,
        user_message: &str,
        history: &str,
        current_recipe: Option<&RecipeDraft>,
    ) -> Result<ProcessOutcome, PipelineError> {
        let profile = store.profile(user_id)?;
        self.process(user_message, history, current_recipe, &profile)
            .await
    }

    /// Check a draft against every rule without repairing it
    pub async fn validate(
        &self,
        draft: &RecipeDraft,
        profile: &UserProfile,
        requested_ingredients: &[String],
    ) -> Vec<Violation> {
        self.orchestrator
            .repair_loop()
            .validate(draft, profile, requested_ingredients)
            .await
    }

    /// Fetch a page and pull the recipe out of it, no generation involved
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult, PipelineError> {
        extractors::extract_from_url(self.fetcher.as_ref(), url).await
    }
}
