//! Keyword predicates applied to the free-text user request.
//!
//! These are deliberately simple substring checks over the lower-cased
//! request. Each returns a typed decision that carries the keyword that
//! matched so callers can log why a branch was taken.

/// Food terms used to build the search query, checked in order.
/// Multi-word dishes come before the single words they end with.
pub const FOOD_KEYWORDS: &[&str] = &[
    "chocolate chip cookies",
    "banana bread",
    "mac and cheese",
    "fried rice",
    "pad thai",
    "apple pie",
    "cheesecake",
    "pancakes",
    "waffles",
    "french toast",
    "cookies",
    "brownies",
    "muffins",
    "cupcakes",
    "cake",
    "bread",
    "pizza",
    "lasagna",
    "pasta",
    "risotto",
    "curry",
    "chili",
    "soup",
    "stew",
    "salad",
    "tacos",
    "burgers",
    "omelette",
    "smoothie",
    "chicken",
    "beef",
    "pork",
    "salmon",
    "fish",
    "tofu",
];

/// Substrings that signal the user cares about the number of servings.
/// Any match triggers scaling, including an incidental "for".
pub const SCALING_TRIGGERS: &[&str] = &[
    "for",
    "people",
    "persons",
    "guests",
    "servings",
    "serves",
    "family",
    "party",
    "gathering",
    "crowd",
    "couple",
    "just me",
    "double",
    "triple",
    "half",
];

/// Dietary restrictions understood by the search stage.
pub const DIETARY_TERMS: &[&str] = &[
    "vegetarian",
    "vegan",
    "keto",
    "paleo",
    "gluten-free",
    "dairy-free",
    "nut-free",
    "soy-free",
    "sugar-free",
    "low-carb",
    "high-protein",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodKeyword {
    Matched(&'static str),
    /// Nothing in the request matched; the configured default is used
    Default,
}

impl FoodKeyword {
    /// The search term to use, given the configured default.
    pub fn term<'a>(&self, default: &'a str) -> &'a str {
        match *self {
            FoodKeyword::Matched(keyword) => keyword,
            FoodKeyword::Default => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingIntent {
    Triggered(&'static str),
    None,
}

impl ScalingIntent {
    pub fn is_triggered(&self) -> bool {
        matches!(self, ScalingIntent::Triggered(_))
    }
}

/// Pick the food item to search for: the first entry of [`FOOD_KEYWORDS`]
/// contained in the request.
pub fn food_keyword(request: &str) -> FoodKeyword {
    let normalized = request.to_lowercase();
    FOOD_KEYWORDS
        .iter()
        .copied()
        .find(|keyword| normalized.contains(keyword))
        .map_or(FoodKeyword::Default, FoodKeyword::Matched)
}

/// Decide whether the request asks for a specific number of servings.
pub fn scaling_intent(request: &str) -> ScalingIntent {
    let normalized = request.to_lowercase();
    SCALING_TRIGGERS
        .iter()
        .copied()
        .find(|trigger| normalized.contains(trigger))
        .map_or(ScalingIntent::None, ScalingIntent::Triggered)
}

/// Dietary restrictions mentioned anywhere in the request, in
/// [`DIETARY_TERMS`] order.
pub fn dietary_terms(request: &str) -> Vec<&'static str> {
    // "gluten free" and "gluten-free" are both common spellings
    let normalized = request.to_lowercase().replace(" free", "-free");
    DIETARY_TERMS
        .iter()
        .copied()
        .filter(|term| normalized.contains(term))
        .collect()
}
