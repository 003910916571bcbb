#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use recipe_assistant::prompts::{EXTRACTION_SYSTEM, FORMATTING_SYSTEM, SCALING_SYSTEM};
use recipe_assistant::{
    AppConfig, CompletionClient, CompletionRequest, FetchError, PageFetcher, Pipeline,
    ProviderError, SearchCandidate, SearchError, SearchProvider,
};

pub fn candidate(url: &str, title: &str) -> SearchCandidate {
    SearchCandidate {
        title: title.to_string(),
        url: url.to_string(),
        description: "A recipe.".to_string(),
        source: "Unknown".to_string(),
    }
}

/// Search stub returning a fixed answer and recording every call
pub struct StubSearch {
    result: Result<Vec<SearchCandidate>, u16>,
    pub calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubSearch {
    pub fn returning(candidates: Vec<SearchCandidate>) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(candidates),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Fails every call with the given HTTP status
    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            result: Err(status),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SearchProvider for StubSearch {
    async fn search(
        &self,
        query: &str,
        restrictions: &[String],
    ) -> Result<Vec<SearchCandidate>, SearchError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), restrictions.to_vec()));
        match &self.result {
            Ok(candidates) => Ok(candidates.clone()),
            Err(status) => Err(SearchError::Status(*status)),
        }
    }
}

/// Serves a small HTML page naming the requested URL
#[derive(Default)]
pub struct StubFetcher {
    pub calls: AtomicUsize,
    failing: Vec<String>,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_for(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: urls.iter().map(|u| u.to_string()).collect(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|u| u == url) {
            return Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            });
        }
        Ok(format!(
            "<html><body><nav>Menu</nav><h1>Recipe page</h1><p>Content of {}</p></body></html>",
            url
        ))
    }
}

type Responder = dyn Fn(&CompletionRequest) -> Result<String, ProviderError> + Send + Sync;

/// Completion client answering through a closure, counting calls per stage
pub struct ScriptedClient {
    responder: Box<Responder>,
    pub requests: Mutex<Vec<CompletionRequest>>,
    extraction: AtomicUsize,
    scaling: AtomicUsize,
    formatting: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(
        responder: impl Fn(&CompletionRequest) -> Result<String, ProviderError>
            + Send
            + Sync
            + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            extraction: AtomicUsize::new(0),
            scaling: AtomicUsize::new(0),
            formatting: AtomicUsize::new(0),
        })
    }

    pub fn extraction_calls(&self) -> usize {
        self.extraction.load(Ordering::SeqCst)
    }

    pub fn scaling_calls(&self) -> usize {
        self.scaling.load(Ordering::SeqCst)
    }

    pub fn formatting_calls(&self) -> usize {
        self.formatting.load(Ordering::SeqCst)
    }

    pub fn prompts_for(&self, system: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.system == system)
            .map(|r| r.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let counter = if request.system == EXTRACTION_SYSTEM {
            &self.extraction
        } else if request.system == SCALING_SYSTEM {
            &self.scaling
        } else if request.system == FORMATTING_SYSTEM {
            &self.formatting
        } else {
            panic!("unexpected system prompt: {}", request.system);
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

pub fn is_extraction(request: &CompletionRequest) -> bool {
    request.system == EXTRACTION_SYSTEM
}

pub fn is_scaling(request: &CompletionRequest) -> bool {
    request.system == SCALING_SYSTEM
}

pub fn is_formatting(request: &CompletionRequest) -> bool {
    request.system == FORMATTING_SYSTEM
}

/// A usable recipe object as the model would return it
pub fn recipe_value(title: &str, servings: &str) -> Value {
    json!({
        "title": title,
        "description": "Light and fluffy",
        "ingredients": [
            {"raw_text": "2 cups flour", "amount": "2", "unit": "cups", "ingredient": "flour"},
            {"raw_text": "2 eggs", "amount": "2", "unit": "", "ingredient": "eggs"},
            {"raw_text": "1 1/2 cups milk", "amount": "1 1/2", "unit": "cups", "ingredient": "milk"}
        ],
        "instructions": [
            {"step": 1, "instruction": "Whisk everything together."},
            {"step": 2, "instruction": "Cook on a hot griddle."}
        ],
        "servings": servings,
        "prep_time": "10 minutes",
        "cook_time": "15 minutes",
        "dietary_tags": ["vegetarian"]
    })
}

pub fn extraction_response(recipe: Value) -> String {
    json!({"success": true, "recipe": recipe}).to_string()
}

pub fn scaling_response(title: &str, from: &str, to: &str, factor: f64) -> String {
    let mut scaled = recipe_value(title, to);
    scaled["url"] = json!("");
    json!({
        "success": true,
        "scaled_recipe": scaled,
        "scaling_info": {
            "original_servings": from,
            "target_servings": to,
            "scaling_factor": factor,
            "scaling_method": "proportional",
            "serving_detection": "from request",
            "unit_conversions": []
        }
    })
    .to_string()
}

pub fn config_with_output(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.output.directory = dir.display().to_string();
    config
}

pub fn pipeline(
    search: Arc<StubSearch>,
    fetcher: Arc<StubFetcher>,
    client: Arc<ScriptedClient>,
    output_dir: &Path,
) -> Pipeline {
    Pipeline::builder()
        .config(config_with_output(output_dir))
        .search_provider(search)
        .page_fetcher(fetcher)
        .completion_client(client)
        .build()
        .unwrap()
}
