pub mod fetchers;
pub mod text;

pub use fetchers::RequestFetcher;
pub use text::page_text;

use async_trait::async_trait;

use crate::error::FetchError;

/// Fetches raw page content for a URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}
