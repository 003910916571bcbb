use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PipelineError;

/// A single search result considered for extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchCandidate {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Human readable site name, "Unknown" for unrecognised domains
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ingredient {
    /// The ingredient line as written on the page
    pub raw_text: String,
    pub amount: String,
    pub unit: String,
    pub ingredient: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionStep {
    /// 1-based and sequential
    pub step: u32,
    pub instruction: String,
}

/// A structured recipe.
///
/// Every field is always present: values the model left out are empty
/// strings or empty collections, never absent. Times and servings stay
/// free text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(deserialize_with = "lenient_ingredients")]
    pub ingredients: Vec<Ingredient>,
    #[serde(deserialize_with = "lenient_instructions")]
    pub instructions: Vec<InstructionStep>,
    #[serde(deserialize_with = "lenient_string")]
    pub prep_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cook_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub total_time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub servings: String,
    #[serde(deserialize_with = "lenient_tags")]
    pub dietary_tags: BTreeSet<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub difficulty: String,
    #[serde(deserialize_with = "lenient_string")]
    pub source: String,
}

impl Recipe {
    /// Coerce a JSON object produced by the completion model into a recipe.
    pub fn from_model_value(value: &Value) -> Result<Self, serde_json::Error> {
        Recipe::deserialize(value)
    }

    /// A recipe is usable once it has a non-blank ingredient and a non-blank step.
    pub fn is_usable(&self) -> bool {
        self.ingredients
            .iter()
            .any(|ingredient| !ingredient.display_text().trim().is_empty())
            && self
                .instructions
                .iter()
                .any(|step| !step.instruction.trim().is_empty())
    }

    /// Plain-text rendering handed to the scaling and formatting prompts.
    pub fn to_prompt_text(&self, with_metadata: bool) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Title: {}", or_unknown(&self.title)));
        if with_metadata {
            lines.push(format!(
                "Description: {}",
                if self.description.is_empty() {
                    "No description available"
                } else {
                    &self.description
                }
            ));
        }
        lines.push(format!("Servings: {}", or_unknown(&self.servings)));
        lines.push(format!("Prep Time: {}", or_unknown(&self.prep_time)));
        lines.push(format!("Cook Time: {}", or_unknown(&self.cook_time)));
        lines.push(format!("Total Time: {}", or_unknown(&self.total_time)));
        if with_metadata {
            lines.push(format!("Difficulty: {}", or_unknown(&self.difficulty)));
            lines.push(format!("Dietary Tags: {}", self.tags_joined()));
            lines.push(format!("Source: {}", or_unknown(&self.source)));
            lines.push(format!(
                "URL: {}",
                if self.url.is_empty() {
                    "No URL available"
                } else {
                    &self.url
                }
            ));
        }
        lines.push(String::new());

        lines.push("INGREDIENTS:".to_string());
        for ingredient in &self.ingredients {
            lines.push(format!("- {}", ingredient.display_text()));
        }
        lines.push(String::new());

        lines.push("INSTRUCTIONS:".to_string());
        for step in &self.instructions {
            lines.push(format!("{}. {}", step.step, step.instruction));
        }

        lines.join("\n")
    }

    pub fn tags_joined(&self) -> String {
        self.dietary_tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fill blank identity fields from another recipe.
    pub(crate) fn inherit_from(&mut self, other: &Recipe) {
        if self.title.is_empty() {
            self.title = other.title.clone();
        }
        if self.url.is_empty() {
            self.url = other.url.clone();
        }
        if self.source.is_empty() {
            self.source = other.source.clone();
        }
    }
}

impl Ingredient {
    /// The best available text for this ingredient.
    pub fn display_text(&self) -> &str {
        if !self.raw_text.is_empty() {
            &self.raw_text
        } else {
            &self.ingredient
        }
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

/// Explanation of a scaling run, as reported by the model.
///
/// Advisory only: nothing guarantees `scaling_factor` matches the
/// ingredient amounts of the scaled recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingReport {
    #[serde(deserialize_with = "lenient_string")]
    pub original_servings: String,
    #[serde(deserialize_with = "lenient_string")]
    pub target_servings: String,
    #[serde(deserialize_with = "lenient_factor")]
    pub scaling_factor: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub scaling_method: String,
    #[serde(deserialize_with = "lenient_string")]
    pub serving_detection: String,
    #[serde(deserialize_with = "lenient_string_list")]
    pub unit_conversions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledRecipe {
    pub original: Recipe,
    pub scaled: Recipe,
    pub report: ScalingReport,
}

/// Target serving count for the scaler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScaleTarget {
    /// Let the model infer the serving count from the request text
    #[default]
    Auto,
    Servings(u32),
}

impl fmt::Display for ScaleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleTarget::Auto => f.write_str("auto"),
            ScaleTarget::Servings(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStyle {
    #[default]
    Cookbook,
    Simple,
    Detailed,
    /// Long personal story before the recipe
    Blogger,
}

impl FormatStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatStyle::Cookbook => "cookbook",
            FormatStyle::Simple => "simple",
            FormatStyle::Detailed => "detailed",
            FormatStyle::Blogger => "blogger",
        }
    }
}

impl fmt::Display for FormatStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cookbook" => Ok(FormatStyle::Cookbook),
            "simple" => Ok(FormatStyle::Simple),
            "detailed" => Ok(FormatStyle::Detailed),
            "blogger" => Ok(FormatStyle::Blogger),
            other => Err(format!(
                "unknown style '{other}' (expected cookbook, simple, detailed or blogger)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedRecipe {
    pub recipe: Recipe,
    pub file_path: String,
    pub content: String,
    pub style: FormatStyle,
    /// True when the local template replaced the model output
    pub used_fallback: bool,
}

/// Terminal output of a pipeline run
#[derive(Debug)]
pub enum PipelineResult {
    Extracted(Recipe),
    Scaled(ScaledRecipe),
    Formatted(FormattedRecipe),
    Failure(PipelineError),
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, PipelineResult::Failure(_))
    }

    /// The final recipe, scaled when scaling ran.
    pub fn recipe(&self) -> Option<&Recipe> {
        match self {
            PipelineResult::Extracted(recipe) => Some(recipe),
            PipelineResult::Scaled(scaled) => Some(&scaled.scaled),
            PipelineResult::Formatted(formatted) => Some(&formatted.recipe),
            PipelineResult::Failure(_) => None,
        }
    }
}

// Lenient deserializers for model output. Models return numbers where strings
// are asked for, nulls for missing data and plain strings where objects are
// expected.

fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => String::new(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let single = value_to_string(other);
            if single.is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    };
    Ok(list)
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(value_to_string).collect::<Vec<_>>(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(raw
        .into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect())
}

fn lenient_factor<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let factor = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches(['x', 'X']).trim().parse().ok(),
        _ => None,
    };
    Ok(factor)
}

fn lenient_ingredients<'de, D>(deserializer: D) -> Result<Vec<Ingredient>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut map) => {
                let mut take = |key: &str| map.remove(key).map(value_to_string).unwrap_or_default();
                let raw_text = take("raw_text");
                let ingredient = take("ingredient");
                let amount = take("amount");
                let unit = take("unit");
                let raw_text = if raw_text.is_empty() && ingredient.is_empty() {
                    [amount.as_str(), unit.as_str()]
                        .into_iter()
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ")
                } else {
                    raw_text
                };
                Ingredient {
                    raw_text: if raw_text.is_empty() {
                        ingredient.clone()
                    } else {
                        raw_text.clone()
                    },
                    ingredient: if ingredient.is_empty() {
                        raw_text
                    } else {
                        ingredient
                    },
                    amount,
                    unit,
                }
            }
            other => {
                let text = value_to_string(other);
                Ingredient {
                    raw_text: text.clone(),
                    ingredient: text,
                    ..Default::default()
                }
            }
        })
        .collect())
}

fn lenient_instructions<'de, D>(deserializer: D) -> Result<Vec<InstructionStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    // Every entry keeps its place; steps are renumbered in the order received
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut map) => ["instruction", "text", "description"]
                .into_iter()
                .find_map(|key| map.remove(key))
                .map(value_to_string)
                .unwrap_or_default(),
            other => value_to_string(other),
        })
        .enumerate()
        .map(|(index, instruction)| InstructionStep {
            step: index as u32 + 1,
            instruction,
        })
        .collect())
}
