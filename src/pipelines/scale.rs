use std::sync::Arc;

use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::config::StageConfig;
use crate::error::ScalingError;
use crate::json::{parse_model_json, truncate_chars};
use crate::model::{Recipe, ScaleTarget, ScaledRecipe, ScalingReport};
use crate::pipelines::extract::RAW_RESPONSE_CHARS;
use crate::prompts::{scaling_prompt, SCALING_SYSTEM};
use crate::providers::{CompletionClient, CompletionRequest};

/// Relative disagreement tolerated between the reported factor and the
/// serving counts before a warning is logged
const FACTOR_TOLERANCE: f64 = 0.05;

/// Rescales a recipe to a serving count with one completion call.
///
/// The model does the arithmetic; its `scaling_info` is passed through as
/// an advisory [`ScalingReport`].
pub struct RecipeScaler {
    client: Arc<dyn CompletionClient>,
    stage: StageConfig,
}

impl RecipeScaler {
    pub fn new(client: Arc<dyn CompletionClient>, stage: StageConfig) -> Self {
        Self { client, stage }
    }

    pub async fn scale(
        &self,
        recipe: &Recipe,
        user_request: &str,
        target: ScaleTarget,
    ) -> Result<ScaledRecipe, ScalingError> {
        info!("Scaling '{}' (target: {})", recipe.title, target);

        let request = CompletionRequest::new(
            SCALING_SYSTEM,
            scaling_prompt(recipe, target, user_request),
            self.stage,
        );
        let response = self.client.complete(&request).await?;
        debug!("Scaling response: {}", response);

        let malformed = |reason: String| ScalingError::Malformed {
            reason,
            raw_response: truncate_chars(&response, RAW_RESPONSE_CHARS),
        };

        let payload = parse_model_json(&response).map_err(|e| malformed(e.to_string()))?;

        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            let reason = payload
                .get("error")
                .and_then(Value::as_str)
                .filter(|e| !e.trim().is_empty())
                .unwrap_or("Scaling failed");
            return Err(ScalingError::Rejected(reason.to_string()));
        }

        let scaled_value = match payload.get("scaled_recipe") {
            Some(value @ Value::Object(_)) => value,
            _ => return Err(ScalingError::MissingField("scaled_recipe")),
        };
        let mut scaled =
            Recipe::from_model_value(scaled_value).map_err(|e| malformed(e.to_string()))?;
        if !scaled.is_usable() {
            return Err(ScalingError::EmptyRecipe);
        }
        scaled.inherit_from(recipe);

        let report = payload
            .get("scaling_info")
            .and_then(|info| ScalingReport::deserialize(info).ok())
            .unwrap_or_default();
        check_factor(&report);

        info!(
            "Scaled '{}' from {} to {} servings",
            scaled.title, report.original_servings, report.target_servings
        );
        Ok(ScaledRecipe {
            original: recipe.clone(),
            scaled,
            report,
        })
    }
}

/// Warn when the reported factor disagrees with the reported serving counts.
/// The result is never altered.
fn check_factor(report: &ScalingReport) -> bool {
    let (Some(factor), Some(original), Some(target)) = (
        report.scaling_factor,
        leading_number(&report.original_servings),
        leading_number(&report.target_servings),
    ) else {
        return true;
    };
    if original == 0 {
        return true;
    }

    let expected = f64::from(target) / f64::from(original);
    let consistent = ((factor - expected) / expected).abs() <= FACTOR_TOLERANCE;
    if !consistent {
        warn!(
            "Reported scaling factor {} does not match {} -> {} servings (expected {:.2})",
            factor, original, target, expected
        );
    }
    consistent
}

/// First run of ASCII digits in `text`, e.g. `"4-6 servings"` -> 4
fn leading_number(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::model::{Ingredient, InstructionStep};
    use async_trait::async_trait;
    use serde_json::json;

    /// Answers every completion with the same text
    struct CannedClient(String);

    #[async_trait]
    impl CompletionClient for CannedClient {
        fn provider_name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    fn scaler(response: Value) -> RecipeScaler {
        RecipeScaler::new(
            Arc::new(CannedClient(response.to_string())),
            StageConfig {
                max_tokens: 3000,
                temperature: 0.1,
            },
        )
    }

    fn pancakes() -> Recipe {
        Recipe {
            title: "Fluffy Pancakes".to_string(),
            url: "https://example.com/pancakes".to_string(),
            source: "example.com".to_string(),
            servings: "4".to_string(),
            ingredients: vec![Ingredient {
                raw_text: "2 cups flour".to_string(),
                ..Default::default()
            }],
            instructions: vec![InstructionStep {
                step: 1,
                instruction: "Mix and fry.".to_string(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_rejected_by_model() {
        let with_reason = scaler(json!({"success": false, "error": "Cannot scale this recipe"}));
        match with_reason.scale(&pancakes(), "for 8", ScaleTarget::Auto).await {
            Err(ScalingError::Rejected(reason)) => assert_eq!(reason, "Cannot scale this recipe"),
            other => panic!("expected rejection, got {:?}", other),
        }

        let without_reason = scaler(json!({"success": false}));
        match without_reason.scale(&pancakes(), "for 8", ScaleTarget::Auto).await {
            Err(ScalingError::Rejected(reason)) => assert_eq!(reason, "Scaling failed"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_scaled_recipe() {
        for response in [
            json!({"success": true, "scaling_info": {"scaling_factor": 2}}),
            json!({"success": true, "scaled_recipe": "double everything"}),
        ] {
            let result = scaler(response)
                .scale(&pancakes(), "for 8", ScaleTarget::Servings(8))
                .await;
            assert!(matches!(
                result,
                Err(ScalingError::MissingField("scaled_recipe"))
            ));
        }
    }

    #[tokio::test]
    async fn test_empty_scaled_recipe() {
        for scaled_recipe in [
            json!({"title": "Pancakes", "ingredients": [], "instructions": ["Fry"]}),
            json!({"title": "Pancakes", "ingredients": ["4 cups flour"]}),
            json!({"ingredients": [""], "instructions": [{"instruction": " "}]}),
        ] {
            let result = scaler(json!({"success": true, "scaled_recipe": scaled_recipe}))
                .scale(&pancakes(), "for 8", ScaleTarget::Servings(8))
                .await;
            assert!(matches!(result, Err(ScalingError::EmptyRecipe)));
        }
    }

    #[tokio::test]
    async fn test_blank_identity_fields_are_inherited() {
        let response = json!({
            "success": true,
            "scaled_recipe": {
                "title": "",
                "servings": "8",
                "ingredients": ["4 cups flour"],
                "instructions": ["Mix and fry."]
            },
            "scaling_info": {
                "original_servings": "4",
                "target_servings": "8",
                "scaling_factor": "2"
            }
        });

        let scaled = scaler(response)
            .scale(&pancakes(), "pancakes for 8", ScaleTarget::Servings(8))
            .await
            .unwrap();

        assert_eq!(scaled.scaled.title, "Fluffy Pancakes");
        assert_eq!(scaled.scaled.url, "https://example.com/pancakes");
        assert_eq!(scaled.scaled.source, "example.com");
        assert_eq!(scaled.scaled.servings, "8");
        assert_eq!(scaled.original, pancakes());
        assert_eq!(scaled.report.scaling_factor, Some(2.0));
    }

    #[tokio::test]
    async fn test_scaled_fields_win_over_original() {
        let response = json!({
            "success": true,
            "scaled_recipe": {
                "title": "Fluffy Pancakes (x2)",
                "source": "scaled",
                "ingredients": ["4 cups flour"],
                "instructions": ["Mix and fry."]
            }
        });

        let scaled = scaler(response)
            .scale(&pancakes(), "for 8", ScaleTarget::Auto)
            .await
            .unwrap();

        assert_eq!(scaled.scaled.title, "Fluffy Pancakes (x2)");
        assert_eq!(scaled.scaled.source, "scaled");
        assert_eq!(scaled.scaled.url, "https://example.com/pancakes");
        // No scaling_info: the report falls back to its defaults
        assert_eq!(scaled.report, ScalingReport::default());
    }

    fn report(original: &str, target: &str, factor: Option<f64>) -> ScalingReport {
        ScalingReport {
            original_servings: original.to_string(),
            target_servings: target.to_string(),
            scaling_factor: factor,
            ..Default::default()
        }
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("4"), Some(4));
        assert_eq!(leading_number("Serves 12 people"), Some(12));
        assert_eq!(leading_number("4-6 servings"), Some(4));
        assert_eq!(leading_number("a few"), None);
    }

    #[test]
    fn test_check_factor() {
        assert!(check_factor(&report("4", "8", Some(2.0))));
        assert!(check_factor(&report("4 servings", "6 servings", Some(1.5))));
        assert!(!check_factor(&report("4", "8", Some(3.0))));
        // Nothing to compare against
        assert!(check_factor(&report("unknown", "8", Some(3.0))));
        assert!(check_factor(&report("4", "8", None)));
    }
}
