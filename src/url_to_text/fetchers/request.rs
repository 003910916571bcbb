use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::url_to_text::PageFetcher;

/// Plain HTTP GET with a browser user agent and a fixed timeout
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for RequestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        debug!("Fetched {} ({} bytes)", url, html.len());
        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_fetch_page() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipe")
            .match_header("user-agent", Matcher::Regex("Mozilla".to_string()))
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><body><h1>Pancakes</h1></body></html>")
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&FetchConfig::default()).unwrap();
        let html = fetcher
            .fetch(&format!("{}/recipe", server.url()))
            .await
            .unwrap();

        assert!(html.contains("<h1>Pancakes</h1>"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/blocked")
            .with_status(403)
            .create_async()
            .await;

        let fetcher = RequestFetcher::new(&FetchConfig::default()).unwrap();
        let result = fetcher.fetch(&format!("{}/blocked", server.url())).await;

        match result {
            Err(FetchError::Status { status, url }) => {
                assert_eq!(status, 403);
                assert!(url.ends_with("/blocked"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}
