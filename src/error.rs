use std::fmt;
use thiserror::Error;

/// Pipeline stage, used to tell the user where a request gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Extraction,
    Scaling,
    Formatting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Search => "search",
            Stage::Extraction => "extraction",
            Stage::Scaling => "scaling",
            Stage::Formatting => "formatting",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the recipe pipeline as a whole
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Empty or malformed request, query or URL
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Network or provider failure
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The completion model answered with something that is not the expected JSON
    #[error("Model response malformed: {0}")]
    ModelResponseMalformed(String),

    /// The search provider returned zero results
    #[error("No recipes found for '{query}'")]
    NoCandidatesFound { query: String },

    /// Every candidate failed extraction
    #[error("All candidates exhausted: none of the {attempted} search results yielded a usable recipe (last error: {last_error})")]
    AllCandidatesExhausted { attempted: usize, last_error: String },

    /// An optional downstream stage failed; the upstream result is still returned
    #[error("{stage} failed, keeping the previous result: {reason}")]
    PartialPipelineFailure { stage: Stage, reason: String },
}

impl PipelineError {
    /// The stage that gave up.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidInput(_)
            | PipelineError::UpstreamUnavailable(_)
            | PipelineError::NoCandidatesFound { .. } => Stage::Search,
            PipelineError::ModelResponseMalformed(_)
            | PipelineError::AllCandidatesExhausted { .. } => Stage::Extraction,
            PipelineError::PartialPipelineFailure { stage, .. } => *stage,
        }
    }
}

impl From<SearchError> for PipelineError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(msg) => PipelineError::InvalidInput(msg),
            SearchError::QueryTooLong(len) => {
                PipelineError::InvalidInput(format!("query too long ({len} characters, maximum 200)"))
            }
            other => PipelineError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::InvalidUrl(url) => {
                PipelineError::InvalidInput(format!("invalid URL '{url}'"))
            }
            ExtractionError::Fetch(e) => PipelineError::UpstreamUnavailable(e.to_string()),
            ExtractionError::Completion(e) => PipelineError::UpstreamUnavailable(e.to_string()),
            other => PipelineError::ModelResponseMalformed(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Query too long: {0} characters")]
    QueryTooLong(usize),

    #[error("Search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search engine returned status {0}")]
    Status(u16),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch URL: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Page request failed with status {status}: {url}")]
    Status { status: u16, url: String },
}

/// Errors raised by completion providers
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Completion API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to extract content from {0} response")]
    MissingContent(String),

    #[error("{0} not found in config or environment")]
    MissingApiKey(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

/// Failure to pull a JSON object out of free-form model output
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJson,

    #[error("Invalid JSON: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("JSON value is not an object")]
    NotAnObject,
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Invalid URL format - must start with http:// or https://: '{0}'")]
    InvalidUrl(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("LLM extraction failed: {0}")]
    Completion(#[from] ProviderError),

    #[error("Malformed model response: {reason}")]
    Malformed { reason: String, raw_response: String },

    #[error("{0}")]
    Rejected(String),

    #[error("No structured recipe data found")]
    NoStructuredData,
}

#[derive(Error, Debug)]
pub enum ScalingError {
    #[error("LLM scaling failed: {0}")]
    Completion(#[from] ProviderError),

    #[error("Malformed model response: {reason}")]
    Malformed { reason: String, raw_response: String },

    #[error("{0}")]
    Rejected(String),

    #[error("Scaling response is missing '{0}'")]
    MissingField(&'static str),

    #[error("Scaled recipe has no ingredients or no instructions")]
    EmptyRecipe,
}

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Output file name must be a plain file name: '{0}'")]
    InvalidFilename(String),

    #[error("Failed to write recipe file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while assembling a pipeline
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Failed to create completion provider: {0}")]
    Provider(#[from] ProviderError),

    #[error("Failed to create search client: {0}")]
    Search(#[from] SearchError),

    #[error("Failed to create page fetcher: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
