use log::debug;
use scraper::{ElementRef, Html, Selector};

use crate::extractors::Extractor;
use crate::model::{Ingredient, InstructionStep, Recipe};

/// Reads recipes from common recipe-card markup when a page carries no
/// structured data.
pub struct HtmlExtractor;

const INGREDIENT_SELECTORS: &[&str] = &[
    "[itemprop='recipeIngredient']",
    ".recipe-ingredients li",
    ".ingredients li",
    ".ingredient-item",
    ".recipe-ingredient",
    "[class*='ingredient'] li",
    "li[class*='ingredient']",
];

const INSTRUCTION_SELECTORS: &[&str] = &[
    "[itemprop='recipeInstructions']",
    ".recipe-instructions li",
    ".instructions li",
    ".instruction-item",
    ".recipe-step",
    "[class*='instruction'] li",
    "[class*='direction'] li",
    "li[class*='step']",
];

const TITLE_SELECTORS: &[&str] = &["h1", ".recipe-title", ".recipe-name"];

/// A selector must match more than this many ingredient lines to be trusted
const MIN_INGREDIENTS: usize = 3;

const INGREDIENT_NOISE: &[&str] = &[
    "ingredients",
    "directions",
    "instructions",
    "steps",
    "cook mode",
    "keep screen awake",
    "something went wrong",
    "recipe was developed",
    "ingredient amounts",
    "original recipe",
    "yields",
];

const INSTRUCTION_NOISE: &[&str] = &[
    "directions",
    "instructions",
    "steps",
    "editor's note",
];

const SERVING_WORDS: &[&str] = &["serves", "serve", "servings", "serving", "yields", "yield", "makes"];

fn element_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_valid_ingredient(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.chars().count() >= 3 && !INGREDIENT_NOISE.iter().any(|noise| lower.contains(noise))
}

fn is_valid_instruction(text: &str) -> bool {
    let lower = text.to_lowercase();
    text.chars().count() >= 10 && !INSTRUCTION_NOISE.iter().any(|noise| lower.contains(noise))
}

/// Texts of the first selector whose valid matches reach `min_count`.
fn first_matching_list(
    document: &Html,
    selectors: &[&str],
    min_count: usize,
    is_valid: fn(&str) -> bool,
) -> Vec<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let texts: Vec<String> = document
            .select(&selector)
            .map(element_text)
            .filter(|text| is_valid(text))
            .collect();
        if texts.len() >= min_count {
            debug!("Selector '{}' matched {} entries", raw, texts.len());
            return texts;
        }
    }
    Vec::new()
}

fn title(document: &Html) -> String {
    TITLE_SELECTORS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
        .unwrap_or_default()
}

/// The number following (or preceding) a serving word, e.g. "Serves 4" or
/// "12 servings".
fn servings(document: &Html) -> String {
    let words: Vec<String> = document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let is_number = |word: &str| word.chars().all(|c| c.is_ascii_digit());
    for (index, word) in words.iter().enumerate() {
        if !SERVING_WORDS.contains(&word.as_str()) {
            continue;
        }
        if let Some(next) = words.get(index + 1).filter(|w| is_number(w)) {
            return next.clone();
        }
        if let Some(previous) = index
            .checked_sub(1)
            .and_then(|i| words.get(i))
            .filter(|w| is_number(w))
        {
            return previous.clone();
        }
    }
    String::new()
}

impl Extractor for HtmlExtractor {
    fn can_parse(&self, document: &Html) -> bool {
        !first_matching_list(document, INGREDIENT_SELECTORS, MIN_INGREDIENTS, is_valid_ingredient)
            .is_empty()
    }

    fn parse(&self, document: &Html) -> Option<Recipe> {
        let ingredients: Vec<Ingredient> =
            first_matching_list(document, INGREDIENT_SELECTORS, MIN_INGREDIENTS, is_valid_ingredient)
                .into_iter()
                .map(|line| Ingredient {
                    raw_text: line.clone(),
                    ingredient: line,
                    ..Default::default()
                })
                .collect();
        if ingredients.is_empty() {
            return None;
        }

        let instructions = first_matching_list(document, INSTRUCTION_SELECTORS, 1, is_valid_instruction)
            .into_iter()
            .enumerate()
            .map(|(index, instruction)| InstructionStep {
                step: index as u32 + 1,
                instruction,
            })
            .collect();

        Some(Recipe {
            title: title(document),
            ingredients,
            instructions,
            servings: servings(document),
            ..Default::default()
        })
    }
}
