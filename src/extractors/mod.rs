//! Recipe extraction straight from page markup, without a model call.

use log::debug;
use scraper::Html;

use crate::model::Recipe;

mod html;
mod json_ld;

pub use self::html::HtmlExtractor;
pub use self::json_ld::JsonLdExtractor;

pub trait Extractor {
    fn can_parse(&self, document: &Html) -> bool;
    fn parse(&self, document: &Html) -> Option<Recipe>;
}

/// Structured data first, then recipe-card markup. Only usable recipes are
/// returned.
pub fn extract_structured(html: &str) -> Option<Recipe> {
    let document = Html::parse_document(html);
    let extractors: [(&str, &dyn Extractor); 2] =
        [("json-ld", &JsonLdExtractor), ("html", &HtmlExtractor)];

    extractors.into_iter().find_map(|(name, extractor)| {
        if !extractor.can_parse(&document) {
            return None;
        }
        let recipe = extractor.parse(&document).filter(Recipe::is_usable);
        debug!("{} extractor found a recipe: {}", name, recipe.is_some());
        recipe
    })
}
