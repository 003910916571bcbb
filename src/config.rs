use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::model::FormatStyle;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Completion endpoint used by every stage
    #[serde(default)]
    pub model: ModelConfig,
    /// Generation parameters for recipe extraction
    #[serde(default = "default_extraction")]
    pub extraction: StageConfig,
    /// Generation parameters for recipe scaling
    #[serde(default = "default_scaling")]
    pub scaling: StageConfig,
    /// Generation parameters for markdown formatting
    #[serde(default = "default_formatting")]
    pub formatting: StageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            extraction: default_extraction(),
            scaling: default_scaling(),
            formatting: default_formatting(),
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Configuration for the completion provider
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Provider name ("openai", "ollama" or "anthropic")
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model identifier (e.g., "gpt-4.1-mini", "qwen/qwen3-4b-2507")
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL for the API endpoint (for local servers or proxies)
    pub base_url: Option<String>,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Request timeout in seconds; completion calls are unbounded when unset
    pub timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

/// Per-stage generation parameters
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct StageConfig {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Temperature for generation (0.0-1.0)
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Search engine base URL; the HTML endpoint lives under `/html/`
    #[serde(default = "default_search_url")]
    pub base_url: String,
    /// Raw results read from the search engine
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Candidates kept after filtering
    #[serde(default = "default_keep_results")]
    pub keep_results: usize,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Sites that consistently block scraping
    #[serde(default = "default_blocked_domains")]
    pub blocked_domains: Vec<String>,
    /// Food term searched for when the request names no known food
    #[serde(default = "default_keyword")]
    pub default_keyword: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_url(),
            max_results: default_max_results(),
            keep_results: default_keep_results(),
            timeout_secs: default_http_timeout(),
            blocked_domains: default_blocked_domains(),
            default_keyword: default_keyword(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Page text budget handed to the extraction prompt
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            max_chars: default_max_chars(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Directory receiving the rendered markdown files
    #[serde(default = "default_output_dir")]
    pub directory: String,
    #[serde(default)]
    pub style: FormatStyle,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            style: FormatStyle::default(),
        }
    }
}

// Default value functions
fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_extraction() -> StageConfig {
    StageConfig {
        max_tokens: 2000,
        temperature: 0.1,
    }
}

fn default_scaling() -> StageConfig {
    StageConfig {
        max_tokens: 3000,
        temperature: 0.1,
    }
}

fn default_formatting() -> StageConfig {
    StageConfig {
        max_tokens: 4000,
        temperature: 0.3,
    }
}

fn default_search_url() -> String {
    "https://html.duckduckgo.com".to_string()
}

fn default_max_results() -> usize {
    10
}

fn default_keep_results() -> usize {
    5
}

fn default_http_timeout() -> u64 {
    10
}

fn default_blocked_domains() -> Vec<String> {
    vec!["foodnetwork.com".to_string()]
}

fn default_keyword() -> String {
    "pancakes".to_string()
}

fn default_max_chars() -> usize {
    6000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_output_dir() -> String {
    "results/recipes".to_string()
}

impl AppConfig {
    /// Load configuration from `config.toml` and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_ASSISTANT__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_ASSISTANT__MODEL__BASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        load_config(None)
    }
}

/// Load configuration from an optional file and environment variables
///
/// When `path` is `None` the optional `config.toml` in the working directory
/// is used. An explicit path must exist.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name("config").required(false),
    };

    let settings = Config::builder()
        .add_source(file)
        // Use double underscore for nested: RECIPE_ASSISTANT__MODEL__API_KEY
        .add_source(
            Environment::with_prefix("RECIPE_ASSISTANT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
