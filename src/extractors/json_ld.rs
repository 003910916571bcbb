use html_escape::decode_html_entities;
use log::debug;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::extractors::Extractor;
use crate::heuristics::dietary_terms;
use crate::model::{Ingredient, InstructionStep, Recipe};

/// Reads schema.org `Recipe` objects from `application/ld+json` scripts.
pub struct JsonLdExtractor;

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<DescriptionType>,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "recipeIngredient", default)]
    recipe_ingredient: Option<OneOrMany>,
    #[serde(rename = "recipeInstructions", default)]
    recipe_instructions: Option<RecipeInstructions>,
    #[serde(rename = "recipeYield", default)]
    recipe_yield: Option<Value>,
    #[serde(rename = "prepTime", default)]
    prep_time: Option<String>,
    #[serde(rename = "cookTime", default)]
    cook_time: Option<String>,
    #[serde(rename = "totalTime", default)]
    total_time: Option<String>,
    #[serde(rename = "recipeCategory", default)]
    recipe_category: Option<OneOrMany>,
    #[serde(rename = "suitableForDiet", default)]
    suitable_for_diet: Option<OneOrMany>,
}

#[derive(Debug, Deserialize)]
struct TextObject {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptionType {
    String(String),
    Object(TextObject),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInstructions {
    String(String),
    Multiple(Vec<InstructionItem>),
}

// Sections are tried before steps: every object without `itemListElement`
// deserializes as a step.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionItem {
    Text(String),
    Section(HowToSection),
    Step(HowToStep),
}

#[derive(Debug, Deserialize)]
struct HowToStep {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HowToSection {
    #[serde(rename = "itemListElement")]
    item_list_element: Vec<InstructionItem>,
}

impl InstructionItem {
    fn collect_texts(self, texts: &mut Vec<String>) {
        match self {
            InstructionItem::Text(text) => texts.push(text),
            InstructionItem::Step(step) => {
                if let Some(text) = step.text.or(step.name).or(step.description) {
                    texts.push(text);
                }
            }
            InstructionItem::Section(section) => {
                for item in section.item_list_element {
                    item.collect_texts(texts);
                }
            }
        }
    }
}

fn decode_html_symbols(text: &str) -> String {
    // Some sites double-encode entities
    decode_html_entities(&decode_html_entities(text))
        .trim()
        .to_string()
}

impl From<JsonLdRecipe> for Recipe {
    fn from(json_ld_recipe: JsonLdRecipe) -> Self {
        let ingredients = json_ld_recipe
            .recipe_ingredient
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .iter()
            .map(|line| decode_html_symbols(line))
            .filter(|line| !line.is_empty())
            .map(|line| Ingredient {
                raw_text: line.clone(),
                ingredient: line,
                ..Default::default()
            })
            .collect();

        let mut texts = Vec::new();
        match json_ld_recipe.recipe_instructions {
            Some(RecipeInstructions::String(text)) => texts.extend(text.lines().map(String::from)),
            Some(RecipeInstructions::Multiple(items)) => {
                for item in items {
                    item.collect_texts(&mut texts);
                }
            }
            None => {}
        }
        let instructions = texts
            .iter()
            .map(|text| decode_html_symbols(text))
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(index, instruction)| InstructionStep {
                step: index as u32 + 1,
                instruction,
            })
            .collect();

        let dietary_tags = json_ld_recipe
            .recipe_category
            .into_iter()
            .chain(json_ld_recipe.suitable_for_diet)
            .flat_map(OneOrMany::into_vec)
            .flat_map(|label| dietary_terms(&diet_words(&label)))
            .map(String::from)
            .collect();

        Recipe {
            title: json_ld_recipe
                .name
                .as_deref()
                .map(decode_html_symbols)
                .unwrap_or_default(),
            description: match json_ld_recipe.description {
                Some(DescriptionType::String(desc)) => decode_html_symbols(&desc),
                Some(DescriptionType::Object(desc)) => decode_html_symbols(&desc.text),
                None => String::new(),
            },
            url: json_ld_recipe.url.unwrap_or_default(),
            ingredients,
            instructions,
            prep_time: readable_duration(json_ld_recipe.prep_time.as_deref()),
            cook_time: readable_duration(json_ld_recipe.cook_time.as_deref()),
            total_time: readable_duration(json_ld_recipe.total_time.as_deref()),
            servings: json_ld_recipe
                .recipe_yield
                .map(yield_text)
                .unwrap_or_default(),
            dietary_tags,
            ..Default::default()
        }
    }
}

/// `recipeYield` as text: a string, a number, or the first entry of a list.
fn yield_text(value: Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.into_iter().next().map(yield_text).unwrap_or_default(),
        _ => String::new(),
    }
}

/// `https://schema.org/GlutenFreeDiet` → `Gluten Free`
fn diet_words(label: &str) -> String {
    let name = label.rsplit('/').next().unwrap_or(label);
    let name = name.strip_suffix("Diet").unwrap_or(name);
    let mut words = String::new();
    for (index, c) in name.chars().enumerate() {
        if index > 0 && c.is_uppercase() {
            words.push(' ');
        }
        words.push(c);
    }
    words
}

/// ISO 8601 durations (`PT1H15M`) become `1 hour 15 minutes`; anything else
/// is kept as written.
fn readable_duration(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim) else {
        return String::new();
    };
    let Some(rest) = raw
        .strip_prefix("PT")
        .or_else(|| raw.strip_prefix("P0DT"))
    else {
        return raw.to_string();
    };

    let mut parts = Vec::new();
    let mut number = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        let Ok(value) = number.parse::<u32>() else {
            return raw.to_string();
        };
        number.clear();
        let unit = match c {
            'H' => "hour",
            'M' => "minute",
            'S' => "second",
            _ => return raw.to_string(),
        };
        if value > 0 {
            let plural = if value == 1 { "" } else { "s" };
            parts.push(format!("{value} {unit}{plural}"));
        }
    }
    if !number.is_empty() || parts.is_empty() {
        return raw.to_string();
    }
    parts.join(" ")
}

fn sanitize_json(json_str: &str) -> String {
    let mut cleaned = json_str.trim().to_string();

    if !cleaned.starts_with('{') && !cleaned.starts_with('[') {
        if let Some(start) = cleaned.find('{') {
            cleaned = cleaned[start..].to_string();
        }
    }

    cleaned = cleaned.replace(",]", "]").replace(",}", "}");
    cleaned = cleaned.replace("<!--", "").replace("-->", "");

    cleaned
}

fn is_recipe_type(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(kind)) => kind == "Recipe",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "Recipe"),
        _ => false,
    }
}

/// The first recipe node in a JSON-LD document: top level, inside an array,
/// or inside `@graph`.
fn find_recipe(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_recipe),
        Value::Object(map) => {
            if is_recipe_type(value) || map.contains_key("recipeInstructions") {
                Some(value)
            } else {
                map.get("@graph").and_then(find_recipe)
            }
        }
        _ => None,
    }
}

fn recipe_nodes(document: &Html) -> Vec<Value> {
    let Ok(selector) = Selector::parse("script[type='application/ld+json']") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|script| {
            let cleaned_json = sanitize_json(&script.inner_html());
            match serde_json::from_str::<Value>(&cleaned_json) {
                Ok(json_ld) => find_recipe(&json_ld).cloned(),
                Err(e) => {
                    debug!("Skipping unreadable JSON-LD block: {}", e);
                    None
                }
            }
        })
        .collect()
}

impl Extractor for JsonLdExtractor {
    fn can_parse(&self, document: &Html) -> bool {
        !recipe_nodes(document).is_empty()
    }

    fn parse(&self, document: &Html) -> Option<Recipe> {
        recipe_nodes(document).into_iter().find_map(|node| {
            match serde_json::from_value::<JsonLdRecipe>(node) {
                Ok(recipe) => Some(Recipe::from(recipe)),
                Err(e) => {
                    debug!("JSON-LD recipe did not match the schema: {}", e);
                    None
                }
            }
        })
    }
}
