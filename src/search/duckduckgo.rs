use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::model::SearchCandidate;
use crate::search::{improve_query, site_name, SearchProvider};

const PREFERRED_DOMAINS: &[&str] = &[
    "allrecipes.com",
    "epicurious.com",
    "bonappetit.com",
    "tasty.co",
    "delish.com",
];

/// Title words of listicle pages that never hold a single recipe
const ROUNDUP_WORDS: &[&str] = &[
    "roundup",
    "collection",
    "best",
    "top",
    "list",
    "guide",
    "favorite",
    "delicious",
    "scrumptious",
    "easy",
    "simple",
];

const RECIPE_URL_WORDS: &[&str] = &["recipe", "cooking", "food"];

/// A result row as scraped from the HTML page
#[derive(Debug, Clone, PartialEq)]
struct RawResult {
    title: String,
    url: String,
    snippet: String,
}

/// Scrapes the DuckDuckGo HTML endpoint.
///
/// Lookups are cached per improved query for the lifetime of the provider so
/// repeated searches yield the same candidates in the same order.
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
    max_results: usize,
    keep_results: usize,
    blocked_domains: Vec<String>,
    cache: Mutex<HashMap<String, Vec<SearchCandidate>>>,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig, user_agent: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
            keep_results: config.keep_results,
            blocked_domains: config.blocked_domains.clone(),
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn cached(&self, query: &str) -> Option<Vec<SearchCandidate>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(query).cloned())
    }

    fn remember(&self, query: String, candidates: &[SearchCandidate]) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(query, candidates.to_vec());
        }
    }

    async fn fetch_results(&self, query: &str) -> Result<Vec<RawResult>, SearchError> {
        let response = self
            .client
            .post(format!("{}/html/", self.base_url))
            .form(&[("q", query)])
            .header("Accept", "text/html")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(parse_results(&body, self.max_results))
    }

    fn keep(&self, result: &RawResult) -> bool {
        let title = result.title.to_lowercase();
        let url = result.url.to_lowercase();

        if self.blocked_domains.iter().any(|d| url.contains(d.as_str())) {
            return false;
        }
        if ROUNDUP_WORDS.iter().any(|word| title.contains(word)) {
            return false;
        }
        PREFERRED_DOMAINS.iter().any(|d| url.contains(d))
            || RECIPE_URL_WORDS.iter().any(|word| url.contains(word))
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(
        &self,
        query: &str,
        restrictions: &[String],
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        let improved = improve_query(query, restrictions)?;

        if let Some(candidates) = self.cached(&improved) {
            debug!("Search cache hit for '{}'", improved);
            return Ok(candidates);
        }

        info!("Searching DuckDuckGo for '{}'", improved);
        let results = self.fetch_results(&improved).await?;
        let raw_count = results.len();

        let candidates: Vec<SearchCandidate> = results
            .into_iter()
            .filter(|r| self.keep(r))
            .take(self.keep_results)
            .map(to_candidate)
            .collect();

        debug!(
            "Kept {} of {} search results for '{}'",
            candidates.len(),
            raw_count,
            improved
        );
        self.remember(improved, &candidates);
        Ok(candidates)
    }
}

fn parse_results(body: &str, max_results: usize) -> Vec<RawResult> {
    let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(body);
    document
        .select(&result_sel)
        .filter_map(|result| {
            let link = result.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            let url = extract_ddg_url(href);
            if url.is_empty() {
                return None;
            }
            let title = link.text().collect::<String>().trim().to_string();
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
            Some(RawResult {
                title,
                url,
                snippet,
            })
        })
        .take(max_results)
        .collect()
}

/// Result links go through a redirect of the form
/// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
fn extract_ddg_url(href: &str) -> String {
    if let Some(pos) = href.find("uddg=") {
        let start = pos + 5;
        let end = href[start..]
            .find('&')
            .map(|i| start + i)
            .unwrap_or(href.len());
        let encoded = &href[start..end];
        if !encoded.is_empty() {
            return urlencoding::decode(encoded)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| encoded.to_string());
        }
    }
    href.to_string()
}

fn to_candidate(result: RawResult) -> SearchCandidate {
    SearchCandidate {
        title: clean_title(&result.title),
        description: clean_description(&result.snippet),
        source: site_name(&result.url).to_string(),
        url: result.url,
    }
}

fn clean_title(title: &str) -> String {
    let title = title
        .split('|')
        .next()
        .unwrap_or_default()
        .split(" - ")
        .next()
        .unwrap_or_default()
        .trim();
    if title.is_empty() {
        "Untitled Recipe".to_string()
    } else {
        title.to_string()
    }
}

fn clean_description(snippet: &str) -> String {
    if snippet.trim().is_empty() {
        return "Recipe description not available".to_string();
    }
    let first = snippet.split('.').next().unwrap_or_default();
    format!("{}.", first.trim())
}
