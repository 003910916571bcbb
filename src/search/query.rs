use crate::error::SearchError;

pub const MAX_QUERY_CHARS: usize = 200;

const FOOD_WORDS: &[&str] = &[
    "cake", "bread", "soup", "pasta", "pizza", "salad", "chicken", "beef", "fish", "vegan",
    "keto", "gluten", "dairy", "free", "healthy", "easy", "quick", "simple", "cookies",
    "muffins", "pancakes", "waffles", "smoothie", "sauce", "dressing",
];

/// Validates a search query and turns it into a recipe search.
///
/// Restrictions not already mentioned are prepended and `recipe` is appended
/// unless the query already asks for one.
pub fn improve_query(query: &str, restrictions: &[String]) -> Result<String, SearchError> {
    let query = query.trim();
    let lower = query.to_lowercase();
    let len = lower.chars().count();

    if query.is_empty() {
        return Err(SearchError::InvalidQuery("empty query".to_string()));
    }
    if len > MAX_QUERY_CHARS {
        return Err(SearchError::QueryTooLong(len));
    }
    if len < 2 {
        return Err(SearchError::InvalidQuery("query too short".to_string()));
    }
    if !lower.chars().any(char::is_alphabetic) {
        return Err(SearchError::InvalidQuery(
            "query contains no alphabetic characters".to_string(),
        ));
    }
    if looks_nonsensical(&lower, len) {
        return Err(SearchError::InvalidQuery(
            "query appears to be nonsensical".to_string(),
        ));
    }

    let missing: Vec<&str> = restrictions
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty() && !lower.contains(&r.to_lowercase()))
        .collect();

    let mut improved = if missing.is_empty() {
        query.to_string()
    } else {
        format!("{} {}", missing.join(" "), query)
    };
    if !lower.contains("recipe") {
        improved.push_str(" recipe");
    }

    Ok(improved)
}

fn looks_nonsensical(lower: &str, len: usize) -> bool {
    if len <= 8 {
        return false;
    }
    let has_food_word = FOOD_WORDS.iter().any(|word| lower.contains(word));
    if has_food_word {
        return false;
    }

    let has_digits = lower.chars().any(|c| c.is_ascii_digit());
    let alpha = lower.chars().filter(|c| c.is_alphabetic()).count();
    has_digits || (alpha as f64 / len as f64) < 0.6
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restrictions(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_appends_recipe() {
        assert_eq!(improve_query("pancakes", &[]).unwrap(), "pancakes recipe");
        assert_eq!(
            improve_query("  banana bread recipe ", &[]).unwrap(),
            "banana bread recipe"
        );
    }

    #[test]
    fn test_prepends_missing_restrictions() {
        let improved =
            improve_query("vegan pancakes", &restrictions(&["vegan", "gluten-free"])).unwrap();
        assert_eq!(improved, "gluten-free vegan pancakes recipe");
    }

    #[test]
    fn test_rejects_empty_and_short() {
        assert!(matches!(
            improve_query("   ", &[]),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            improve_query("a", &[]),
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            improve_query("12345", &[]),
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_rejects_too_long() {
        let query = "pancakes ".repeat(30);
        match improve_query(&query, &[]) {
            Err(SearchError::QueryTooLong(len)) => assert!(len > MAX_QUERY_CHARS),
            other => panic!("expected QueryTooLong, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_nonsense() {
        assert!(improve_query("asdf1234qwer", &[]).is_err());
        assert!(improve_query("x!@#$%^&*yz", &[]).is_err());
        // Food words keep digit-bearing queries alive
        assert_eq!(
            improve_query("3 ingredient pancakes", &[]).unwrap(),
            "3 ingredient pancakes recipe"
        );
    }
}
