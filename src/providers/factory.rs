use crate::config::{AppConfig, ProviderConfig};
use crate::error::GenerationError;
use crate::providers::{AnthropicProvider, LlmProvider, OpenAIProvider};
use std::time::Duration;

/// Generation backends that can be named in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    /// Default fallback order
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Anthropic];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    fn build(
        self,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, GenerationError> {
        let provider: Box<dyn LlmProvider> = match self {
            ProviderKind::OpenAi => Box::new(OpenAIProvider::new(config, timeout)?),
            ProviderKind::Anthropic => Box::new(AnthropicProvider::new(config, timeout)?),
        };
        Ok(provider)
    }
}

pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the named provider. Every request it sends is bounded by `timeout`.
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Box<dyn LlmProvider>, GenerationError> {
        let kind = ProviderKind::from_name(provider_name).ok_or_else(|| {
            GenerationError::NotConfigured(format!("Unknown provider: {}", provider_name))
        })?;
        if !config.enabled {
            return Err(GenerationError::NotConfigured(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }
        kind.build(config, timeout)
    }

    /// The `default_provider` entry, with the configured request timeout
    pub fn get_default_provider(config: &AppConfig) -> Result<Box<dyn LlmProvider>, GenerationError> {
        let provider_name = &config.default_provider;
        let provider_config = config.providers.get(provider_name).ok_or_else(|| {
            GenerationError::NotConfigured(format!(
                "Default provider '{}' not found in configuration",
                provider_name
            ))
        })?;

        Self::create(provider_name, provider_config, Duration::from_secs(config.timeout))
    }

    pub fn available_providers() -> Vec<&'static str> {
        ProviderKind::ALL.iter().map(ProviderKind::name).collect()
    }
}
