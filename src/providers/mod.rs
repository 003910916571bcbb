mod anthropic;
mod factory;
mod open_ai;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use open_ai::OpenAIProvider;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::StageConfig;
use crate::error::ProviderError;

/// A single chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System message describing the model's role
    pub system: String,
    /// User message carrying the full task
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, stage: StageConfig) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens: stage.max_tokens,
            temperature: stage.temperature,
        }
    }
}

/// Unified trait for chat completion endpoints.
///
/// Implementations return the raw text of the first choice. No structure is
/// enforced server-side; callers parse the text themselves.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// HTTP client for completion calls; without a timeout a call may block
/// for as long as the server takes.
fn build_client(timeout_secs: Option<u64>) -> Result<Client, ProviderError> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}
