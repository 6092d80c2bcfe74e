mod request;

pub use request::RequestFetcher;

use async_trait::async_trait;

use crate::error::PipelineError;

/// Retrieves the raw document behind a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError>;
}
