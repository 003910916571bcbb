//! Find a recipe on the web, pull it into a structured form, rescale it to
//! the requested serving count and render it as markdown.
//!
//! ```no_run
//! # use recipe_assistant::{Pipeline, PipelineResult};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::builder().build()?;
//! match pipeline.run("gluten-free banana bread", &Default::default()).await {
//!     PipelineResult::Formatted(formatted) => println!("{}", formatted.file_path),
//!     PipelineResult::Failure(err) => eprintln!("{} stage: {}", err.stage(), err),
//!     other => println!("{:?}", other.recipe()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod extractors;
pub mod heuristics;
pub mod json;
pub mod model;
pub mod pipelines;
pub mod prompts;
pub mod providers;
pub mod search;
pub mod url_to_text;

pub use builder::PipelineBuilder;
pub use config::{load_config, AppConfig};
pub use error::{
    BuilderError, ExtractionError, FetchError, FormatError, ParseError, PipelineError,
    ProviderError, ScalingError, SearchError, Stage,
};
pub use model::{
    FormatStyle, FormattedRecipe, Ingredient, InstructionStep, PipelineResult, Recipe,
    ScaleTarget, ScaledRecipe, ScalingReport, SearchCandidate,
};
pub use pipelines::{Pipeline, RecipeExtractor, RecipeFormatter, RecipeScaler, RunOptions};
pub use providers::{CompletionClient, CompletionRequest};
pub use search::SearchProvider;
pub use url_to_text::PageFetcher;
