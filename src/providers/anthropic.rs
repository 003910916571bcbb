use crate::config::ModelConfig;
use crate::error::ProviderError;
use crate::providers::{build_client, CompletionClient, CompletionRequest};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider from configuration
    pub fn new(config: &ModelConfig) -> Result<Self, ProviderError> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| ProviderError::MissingApiKey("ANTHROPIC_API_KEY".to_string()))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com".to_string());

        Ok(AnthropicProvider {
            client: build_client(config.timeout_secs)?,
            api_key,
            base_url,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&json!({
                "model": self.model,
                "max_tokens": request.max_tokens,
                "temperature": request.temperature,
                "system": request.system,
                "messages": [
                    {
                        "role": "user",
                        "content": request.prompt
                    }
                ]
            }))
            .send()
            .await?;

        let status = response.status();
        let response_body: Value = response.json().await?;
        debug!("Anthropic response: {:?}", response_body);

        // Check for API error response
        if let Some(error) = response_body.get("error") {
            let error_type = error["type"].as_str().unwrap_or("unknown");
            let error_message = error["message"].as_str().unwrap_or("Unknown error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: format!("{}: {}", error_type, error_message),
            });
        }

        let content = response_body["content"][0]["text"]
            .as_str()
            .ok_or_else(|| ProviderError::MissingContent("anthropic".to_string()))?
            .trim()
            .to_string();

        Ok(content)
    }
}
