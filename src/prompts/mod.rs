//! Prompt templates for the three model-backed stages.
//!
//! The templates are loaded from the `.txt` files next to this module at
//! compile time using `include_str!`, so they can be edited without dealing
//! with Rust string syntax. Placeholders look like `{{NAME}}`; large
//! page/recipe text is injected last so its content is never rescanned.

use crate::model::{FormatStyle, Recipe, ScaleTarget};

pub const EXTRACTION_PROMPT: &str = include_str!("extraction.txt");
pub const SCALING_PROMPT: &str = include_str!("scaling.txt");
pub const FORMATTING_PROMPT: &str = include_str!("formatting.txt");

pub const EXTRACTION_SYSTEM: &str =
    "You are a recipe extraction expert. Extract recipe information and return only valid JSON.";
pub const SCALING_SYSTEM: &str =
    "You are a recipe scaling expert. Scale recipes intelligently and return only valid JSON.";
pub const FORMATTING_SYSTEM: &str =
    "You are a professional recipe formatter. Create beautiful, well-structured markdown recipes.";

const SOURCE_RULES: &str = "- Add a \"## Source\" section at the very end of the recipe\n\
- Format the link as: [Original Recipe URL]({{URL}})\n";

pub fn extraction_prompt(page_text: &str, url: &str) -> String {
    EXTRACTION_PROMPT
        .replace("{{URL}}", url)
        .replace("{{CONTENT}}", page_text)
}

pub fn scaling_prompt(recipe: &Recipe, target: ScaleTarget, request: &str) -> String {
    let request = if request.trim().is_empty() {
        "Not provided"
    } else {
        request
    };
    SCALING_PROMPT
        .replace("{{TARGET}}", &target.to_string())
        .replace("{{REQUEST}}", request)
        .replace("{{RECIPE}}", &recipe.to_prompt_text(false))
}

pub fn formatting_prompt(recipe: &Recipe, style: FormatStyle) -> String {
    // The source section is only requested when there is a link to show
    let source_rules = if recipe.url.is_empty() {
        String::new()
    } else {
        SOURCE_RULES.replace("{{URL}}", &recipe.url)
    };
    FORMATTING_PROMPT
        .replace("{{STYLE_INSTRUCTIONS}}", style_instructions(style))
        .replace("{{STYLE}}", style.as_str())
        .replace("{{SOURCE_RULES}}", &source_rules)
        .replace("{{RECIPE}}", &recipe.to_prompt_text(true))
}

pub fn style_instructions(style: FormatStyle) -> &'static str {
    match style {
        FormatStyle::Cookbook => "Format like a professional cookbook with elegant headers, clear sections, and beautiful typography",
        FormatStyle::Simple => "Format in a clean, simple style with minimal decoration but clear structure",
        FormatStyle::Detailed => "Format with comprehensive details, tips, and extensive formatting",
        FormatStyle::Blogger => "Format like a heartfelt personal blog post with a long, emotional story about life, family and memories that barely relates to the recipe, ending with 'anyways here's that recipe'",
    }
}
