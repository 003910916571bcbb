use crate::config::ModelConfig;
use crate::error::ProviderError;
use crate::providers::{AnthropicProvider, CompletionClient, OpenAIProvider};
use std::sync::Arc;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a completion client from configuration
    pub fn create(config: &ModelConfig) -> Result<Arc<dyn CompletionClient>, ProviderError> {
        match config.provider.as_str() {
            "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
            "ollama" => Ok(Arc::new(OpenAIProvider::ollama(config)?)),
            "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "ollama", "anthropic"]
    }
}
