//! Web search for candidate recipe pages.

mod duckduckgo;
pub mod query;

pub use duckduckgo::DuckDuckGoSearch;
pub use query::improve_query;

use async_trait::async_trait;

use crate::error::SearchError;
use crate::model::SearchCandidate;

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Ordered candidates for a free-text query. An empty list is a valid
    /// answer; errors are reserved for bad queries and an unreachable engine.
    async fn search(
        &self,
        query: &str,
        restrictions: &[String],
    ) -> Result<Vec<SearchCandidate>, SearchError>;
}

/// Host part of a URL without a leading `www.`
pub fn domain(url: &str) -> &str {
    let rest = url
        .trim()
        .split_once("://")
        .map_or(url.trim(), |(_, rest)| rest);
    let host = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(rest);
    let host = host.rsplit_once('@').map_or(host, |(_, host)| host);
    let host = host.split(':').next().unwrap_or(host);
    host.strip_prefix("www.").unwrap_or(host)
}

/// Display name for the well known recipe sites
pub fn site_name(url: &str) -> &'static str {
    if url.contains("allrecipes.com") {
        "AllRecipes"
    } else if url.contains("foodnetwork.com") {
        "Food Network"
    } else if url.contains("bonappetit.com") {
        "Bon Appétit"
    } else if url.contains("epicurious.com") {
        "Epicurious"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain() {
        assert_eq!(domain("https://www.allrecipes.com/recipe/1/x"), "allrecipes.com");
        assert_eq!(domain("http://localhost:8080/page?q=1"), "localhost");
        assert_eq!(domain("https://cooking.example.org"), "cooking.example.org");
        assert_eq!(domain("example.com/path"), "example.com");
    }

    #[test]
    fn test_site_name() {
        assert_eq!(site_name("https://www.bonappetit.com/recipe/x"), "Bon Appétit");
        assert_eq!(site_name("https://www.epicurious.com/recipes/y"), "Epicurious");
        assert_eq!(site_name("https://myblog.net/food/z"), "Unknown");
    }
}
