use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::BuilderError;
use crate::pipelines::{Pipeline, RecipeExtractor, RecipeFormatter, RecipeScaler};
use crate::providers::{CompletionClient, ProviderFactory};
use crate::search::{DuckDuckGoSearch, SearchProvider};
use crate::url_to_text::{PageFetcher, RequestFetcher};

/// Builder for assembling a [`Pipeline`]
///
/// Every collaborator not set explicitly is created from the configuration:
/// DuckDuckGo for search, a plain HTTP fetcher for pages and the configured
/// completion provider for all three model stages.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<AppConfig>,
    search: Option<Arc<dyn SearchProvider>>,
    fetcher: Option<Arc<dyn PageFetcher>>,
    client: Option<Arc<dyn CompletionClient>>,
    output_dir: Option<PathBuf>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration instead of loading `config.toml` and the
    /// environment
    ///
    /// # Example
    /// ```
    /// use recipe_assistant::{AppConfig, Pipeline};
    ///
    /// let mut config = AppConfig::default();
    /// config.output.directory = "out/recipes".to_string();
    /// let builder = Pipeline::builder().config(config);
    /// ```
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn search_provider(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn page_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Completion client shared by extraction, scaling and formatting
    pub fn completion_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Directory for formatted recipes, overriding `output.directory`
    ///
    /// # Example
    /// ```
    /// use recipe_assistant::Pipeline;
    ///
    /// let builder = Pipeline::builder().output_dir("/tmp/recipes");
    /// ```
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Assemble the pipeline
    ///
    /// # Errors
    /// Returns `BuilderError` if:
    /// - No configuration was given and loading it fails
    /// - The configured provider is unknown or lacks an API key
    /// - An HTTP client cannot be created
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_assistant::Pipeline;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pipeline = Pipeline::builder().build()?;
    /// let result = pipeline
    ///     .run("vegan pancakes for 6 people", &Default::default())
    ///     .await;
    /// println!("{}", result.is_success());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<Pipeline, BuilderError> {
        let config = match self.config {
            Some(config) => config,
            None => AppConfig::load()?,
        };

        let client = match self.client {
            Some(client) => client,
            None => ProviderFactory::create(&config.model)?,
        };
        let search = match self.search {
            Some(search) => search,
            None => Arc::new(DuckDuckGoSearch::new(
                &config.search,
                &config.fetch.user_agent,
            )?),
        };
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(RequestFetcher::new(&config.fetch)?),
        };
        let output_dir = self
            .output_dir
            .unwrap_or_else(|| PathBuf::from(&config.output.directory));

        let extractor = RecipeExtractor::new(
            fetcher,
            Arc::clone(&client),
            config.extraction,
            config.fetch.max_chars,
        );
        let scaler = RecipeScaler::new(Arc::clone(&client), config.scaling);
        let formatter = RecipeFormatter::new(client, config.formatting, output_dir);

        Ok(Pipeline::from_parts(
            search,
            extractor,
            scaler,
            formatter,
            config.search.default_keyword,
            config.output.style,
        ))
    }
}
