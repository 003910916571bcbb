use crate::config::ModelConfig;
use crate::error::ProviderError;
use crate::providers::{build_client, CompletionClient, CompletionRequest};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI chat completions, also spoken by LM Studio, Ollama and most
/// local model servers.
pub struct OpenAIProvider {
    client: Client,
    name: &'static str,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    ///
    /// The API key comes from the config first, then `OPENAI_API_KEY`. A key
    /// is only mandatory for the default api.openai.com endpoint; a custom
    /// `base_url` may point at a keyless local server.
    pub fn new(config: &ModelConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok());

        if api_key.is_none() && config.base_url.is_none() {
            return Err(ProviderError::MissingApiKey("OPENAI_API_KEY".to_string()));
        }

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(OpenAIProvider {
            client: build_client(config.timeout_secs)?,
            name: "openai",
            api_key,
            base_url,
            model: config.model.clone(),
        })
    }

    /// Ollama exposes the same API on localhost:11434 without authentication
    pub fn ollama(config: &ModelConfig) -> Result<Self, ProviderError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(OpenAIProvider {
            client: build_client(config.timeout_secs)?,
            name: "ollama",
            api_key: None,
            base_url,
            model: config.model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: Option<String>, base_url: String, model: String) -> Self {
        OpenAIProvider {
            client: Client::new(),
            name: "openai",
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAIProvider {
    fn provider_name(&self) -> &str {
        self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let mut http = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/')));
        if let Some(key) = &self.api_key {
            http = http.header("Authorization", format!("Bearer {}", key));
        }

        let response = http
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": request.system},
                    {"role": "user", "content": request.prompt}
                ],
                "temperature": request.temperature,
                "max_tokens": request.max_tokens
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_body: Value = response.json().await?;
        debug!("{} response: {:?}", self.name, response_body);

        let content = response_body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ProviderError::MissingContent(self.name.to_string()))?
            .trim()
            .to_string();

        Ok(content)
    }
}
