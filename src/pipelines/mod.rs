//! The recipe pipeline: search, extract, scale and format.
//!
//! Stages run strictly one after another. Search failures end the run,
//! extraction failures move on to the next candidate, and scaling or
//! formatting failures fall back to the result of the previous stage.

pub mod extract;
pub mod format;
pub mod scale;

pub use extract::RecipeExtractor;
pub use format::RecipeFormatter;
pub use scale::RecipeScaler;

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{error, info, warn};

use crate::builder::PipelineBuilder;
use crate::error::{ExtractionError, PipelineError, Stage};
use crate::heuristics::{dietary_terms, food_keyword, scaling_intent, FoodKeyword};
use crate::model::{
    FormatStyle, PipelineResult, Recipe, ScaleTarget, ScaledRecipe, SearchCandidate,
};
use crate::search::SearchProvider;

/// Per-run knobs on top of the request text
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub restrictions: BTreeSet<String>,
    /// Explicit serving count; scaling always runs when set
    pub servings: Option<u32>,
    /// Overrides the configured output style
    pub style: Option<FormatStyle>,
    pub output_filename: Option<String>,
    /// Skip the formatting stage when false
    pub format: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            restrictions: BTreeSet::new(),
            servings: None,
            style: None,
            output_filename: None,
            format: true,
        }
    }
}

pub struct Pipeline {
    search: Arc<dyn SearchProvider>,
    extractor: RecipeExtractor,
    scaler: RecipeScaler,
    formatter: RecipeFormatter,
    default_keyword: String,
    default_style: FormatStyle,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub(crate) fn from_parts(
        search: Arc<dyn SearchProvider>,
        extractor: RecipeExtractor,
        scaler: RecipeScaler,
        formatter: RecipeFormatter,
        default_keyword: String,
        default_style: FormatStyle,
    ) -> Self {
        Self {
            search,
            extractor,
            scaler,
            formatter,
            default_keyword,
            default_style,
        }
    }

    /// Run the full pipeline with default options.
    pub async fn run(
        &self,
        user_request: &str,
        dietary_restrictions: &BTreeSet<String>,
    ) -> PipelineResult {
        let options = RunOptions {
            restrictions: dietary_restrictions.clone(),
            ..Default::default()
        };
        self.run_with(user_request, &options).await
    }

    pub async fn run_with(&self, user_request: &str, options: &RunOptions) -> PipelineResult {
        let user_request = user_request.trim();
        if user_request.is_empty() {
            let err = PipelineError::InvalidInput("empty request".to_string());
            error!("{}", err);
            return PipelineResult::Failure(err);
        }

        let keyword = food_keyword(user_request);
        if keyword == FoodKeyword::Default {
            warn!(
                "No known food in '{}', searching for '{}'",
                user_request, self.default_keyword
            );
        }
        let query = keyword.term(&self.default_keyword);

        let mut restrictions = options.restrictions.clone();
        restrictions.extend(dietary_terms(user_request).into_iter().map(String::from));
        let restrictions: Vec<String> = restrictions.into_iter().collect();

        info!(
            "Searching for '{}' (restrictions: [{}])",
            query,
            restrictions.join(", ")
        );
        let candidates = match self.search.search(query, &restrictions).await {
            Ok(candidates) if candidates.is_empty() => {
                let err = PipelineError::NoCandidatesFound {
                    query: query.to_string(),
                };
                error!("{}", err);
                return PipelineResult::Failure(err);
            }
            Ok(candidates) => candidates,
            Err(e) => {
                let err = PipelineError::from(e);
                error!("Search failed: {}", err);
                return PipelineResult::Failure(err);
            }
        };

        let recipe = match self.first_usable_recipe(&candidates).await {
            Ok(recipe) => recipe,
            Err(err) => {
                error!("{}", err);
                return PipelineResult::Failure(err);
            }
        };

        let target = match options.servings {
            Some(servings) => Some(ScaleTarget::Servings(servings)),
            None => scaling_intent(user_request)
                .is_triggered()
                .then_some(ScaleTarget::Auto),
        };
        let scaled = match target {
            Some(target) => self.scale_or_keep(&recipe, user_request, target).await,
            None => None,
        };

        if !options.format {
            return previous_result(recipe, scaled);
        }

        let style = options.style.unwrap_or(self.default_style);
        let to_format = scaled.as_ref().map_or(&recipe, |s| &s.scaled);
        let formatted = self
            .formatter
            .format(to_format, style, options.output_filename.as_deref())
            .await;
        match formatted {
            Ok(formatted) => PipelineResult::Formatted(formatted),
            Err(e) => {
                let err = PipelineError::PartialPipelineFailure {
                    stage: Stage::Formatting,
                    reason: e.to_string(),
                };
                warn!("{}", err);
                previous_result(recipe, scaled)
            }
        }
    }

    /// Search only, with the same error mapping as a full run.
    pub async fn search(
        &self,
        query: &str,
        restrictions: &[String],
    ) -> Result<Vec<SearchCandidate>, PipelineError> {
        Ok(self.search.search(query, restrictions).await?)
    }

    /// Extract a single page without searching.
    pub async fn extract(&self, url: &str) -> Result<Recipe, ExtractionError> {
        self.extractor.extract(url).await
    }

    /// Extract a single page from its structured data, without the model.
    pub async fn extract_structured(&self, url: &str) -> Result<Recipe, ExtractionError> {
        self.extractor.extract_structured(url).await
    }

    async fn first_usable_recipe(
        &self,
        candidates: &[SearchCandidate],
    ) -> Result<Recipe, PipelineError> {
        let mut last_error = String::new();

        for (index, candidate) in candidates.iter().enumerate() {
            info!(
                "Extracting candidate {}/{}: {} ({})",
                index + 1,
                candidates.len(),
                candidate.title,
                candidate.url
            );
            match self.extractor.extract(&candidate.url).await {
                Ok(recipe) if recipe.is_usable() => return Ok(recipe),
                Ok(_) => {
                    last_error = "recipe has no ingredients or no instructions".to_string();
                    warn!("Skipping {}: {}", candidate.url, last_error);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", candidate.url, e);
                    last_error = e.to_string();
                }
            }
        }

        Err(PipelineError::AllCandidatesExhausted {
            attempted: candidates.len(),
            last_error,
        })
    }

    async fn scale_or_keep(
        &self,
        recipe: &Recipe,
        user_request: &str,
        target: ScaleTarget,
    ) -> Option<ScaledRecipe> {
        match self.scaler.scale(recipe, user_request, target).await {
            Ok(scaled) => Some(scaled),
            Err(e) => {
                let err = PipelineError::PartialPipelineFailure {
                    stage: Stage::Scaling,
                    reason: e.to_string(),
                };
                warn!("{}", err);
                None
            }
        }
    }
}

fn previous_result(recipe: Recipe, scaled: Option<ScaledRecipe>) -> PipelineResult {
    match scaled {
        Some(scaled) => PipelineResult::Scaled(scaled),
        None => PipelineResult::Extracted(recipe),
    }
}
