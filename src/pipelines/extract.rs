use std::sync::Arc;

use log::{debug, info};
use serde_json::{Map, Value};

use crate::config::StageConfig;
use crate::error::ExtractionError;
use crate::extractors::extract_structured;
use crate::json::{parse_model_json, truncate_chars};
use crate::model::Recipe;
use crate::prompts::{extraction_prompt, EXTRACTION_SYSTEM};
use crate::providers::{CompletionClient, CompletionRequest};
use crate::search::domain;
use crate::url_to_text::{page_text, PageFetcher};

/// Raw model output kept on parse failures
pub(crate) const RAW_RESPONSE_CHARS: usize = 500;

/// Turns a recipe page into a structured [`Recipe`] with one completion call.
///
/// This pipeline:
/// 1. Fetches the page
/// 2. Reduces the HTML to its visible text, capped at `max_chars`
/// 3. Asks the model for the recipe as JSON
/// 4. Coerces the answer into a `Recipe`
pub struct RecipeExtractor {
    fetcher: Arc<dyn PageFetcher>,
    client: Arc<dyn CompletionClient>,
    stage: StageConfig,
    max_chars: usize,
}

impl RecipeExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        client: Arc<dyn CompletionClient>,
        stage: StageConfig,
        max_chars: usize,
    ) -> Self {
        Self {
            fetcher,
            client,
            stage,
            max_chars,
        }
    }

    pub async fn extract(&self, url: &str) -> Result<Recipe, ExtractionError> {
        let url = checked_url(url)?;
        let html = self.fetcher.fetch(url).await?;
        let text = page_text(&html, self.max_chars);
        debug!("Page text for {}: {} characters", url, text.chars().count());

        let request = CompletionRequest::new(
            EXTRACTION_SYSTEM,
            extraction_prompt(&text, url),
            self.stage,
        );
        let response = self.client.complete(&request).await?;
        debug!("Extraction response: {}", response);

        let payload = parse_model_json(&response).map_err(|e| ExtractionError::Malformed {
            reason: e.to_string(),
            raw_response: truncate_chars(&response, RAW_RESPONSE_CHARS),
        })?;

        let recipe_value = accepted_recipe(&payload)?;
        let mut recipe =
            Recipe::from_model_value(recipe_value).map_err(|e| ExtractionError::Malformed {
                reason: e.to_string(),
                raw_response: truncate_chars(&response, RAW_RESPONSE_CHARS),
            })?;

        fill_origin(&mut recipe, url);
        info!(
            "Extracted '{}' from {} ({} ingredients, {} steps)",
            recipe.title,
            url,
            recipe.ingredients.len(),
            recipe.instructions.len()
        );
        Ok(recipe)
    }

    /// Read the recipe from the page's JSON-LD or recipe-card markup; no
    /// completion call is made.
    pub async fn extract_structured(&self, url: &str) -> Result<Recipe, ExtractionError> {
        let url = checked_url(url)?;
        let html = self.fetcher.fetch(url).await?;

        let mut recipe = extract_structured(&html).ok_or(ExtractionError::NoStructuredData)?;
        fill_origin(&mut recipe, url);
        info!(
            "Read '{}' from the markup of {} ({} ingredients, {} steps)",
            recipe.title,
            url,
            recipe.ingredients.len(),
            recipe.instructions.len()
        );
        Ok(recipe)
    }
}

fn checked_url(url: &str) -> Result<&str, ExtractionError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(ExtractionError::InvalidUrl(url.to_string()))
    }
}

/// Blank url and source point back at the page the recipe came from
fn fill_origin(recipe: &mut Recipe, url: &str) {
    if recipe.url.is_empty() {
        recipe.url = url.to_string();
    }
    if recipe.source.is_empty() {
        recipe.source = domain(url).to_string();
    }
}

/// The `recipe` object of a payload the model did not reject
fn accepted_recipe(payload: &Map<String, Value>) -> Result<&Value, ExtractionError> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        let reason = payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.trim().is_empty())
            .unwrap_or("No recipe found in content");
        return Err(ExtractionError::Rejected(reason.to_string()));
    }

    match payload.get("recipe") {
        Some(recipe @ Value::Object(_)) => Ok(recipe),
        _ => Err(ExtractionError::Rejected(
            "Response contains no recipe object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_accepted_recipe() {
        let ok = payload(json!({"success": true, "recipe": {"title": "Soup"}}));
        assert_eq!(accepted_recipe(&ok).unwrap()["title"], "Soup");

        // A missing success flag is not a rejection
        let implicit = payload(json!({"recipe": {"title": "Soup"}}));
        assert!(accepted_recipe(&implicit).is_ok());
    }

    #[test]
    fn test_rejected_payloads() {
        let rejected = payload(json!({"success": false, "error": "Not a recipe page"}));
        match accepted_recipe(&rejected) {
            Err(ExtractionError::Rejected(reason)) => assert_eq!(reason, "Not a recipe page"),
            other => panic!("expected rejection, got {:?}", other),
        }

        let no_error = payload(json!({"success": false}));
        match accepted_recipe(&no_error) {
            Err(ExtractionError::Rejected(reason)) => {
                assert_eq!(reason, "No recipe found in content")
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        let not_object = payload(json!({"success": true, "recipe": "pancakes"}));
        assert!(matches!(
            accepted_recipe(&not_object),
            Err(ExtractionError::Rejected(_))
        ));
    }
}
