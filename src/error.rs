use thiserror::Error;

/// Errors that can surface from a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Blank or malformed mandatory input. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fetching the page or every extraction strategy failed.
    /// The caller should ask the user to paste the recipe text instead.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The text-generation service was unreachable or returned unusable output
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Failed to fetch a URL
    #[error("Failed to fetch URL: {0}")]
    Fetch(#[from] reqwest::Error),

    /// No profile is stored for the given user
    #[error("Unknown user profile: {0}")]
    UnknownProfile(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PipelineError {
    /// Whether the caller can recover by asking the user for different input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Extraction(_) | PipelineError::Fetch(_))
    }
}

/// Errors raised by a text-generation provider
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedOutput(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("All providers failed:\n{0}")]
    AllProvidersFailed(String),
}

impl From<serde_json::Error> for GenerationError {
    fn from(e: serde_json::Error) -> Self {
        GenerationError::MalformedOutput(e.to_string())
    }
}
