//! HTTP client for the search service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::api_types::{SearchResponse, SearchResult};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::filter::extract_video_id;
use crate::service::SearchService;

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// oEmbed endpoint used to confirm a video still exists.
const VIDEO_OEMBED_URL: &str = "https://www.youtube.com/oembed";

/// Client for the hosted search API.
#[derive(Debug, Clone)]
pub struct SearchClient {
    http: Client,
    config: SearchConfig,
}

impl SearchClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`SearchConfig::from_env`] for the variables consulted.
    pub fn from_env() -> Result<Self, SearchError> {
        Self::new(SearchConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

#[async_trait]
impl SearchService for SearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!("{}/search", self.config.base_url);

        debug!("Search request: {}", query);

        let num = limit.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("engine", self.config.engine.as_str()),
                ("q", query),
                ("api_key", self.config.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SearchResponse = response.json().await?;

        let results: Vec<SearchResult> = parsed
            .organic_results
            .into_iter()
            .filter_map(|entry| entry.into_result())
            .take(limit)
            .collect();

        debug!("Search returned {} results", results.len());
        Ok(results)
    }

    async fn probe_video_link(&self, link: &str) -> bool {
        let Some(video_id) = extract_video_id(link) else {
            return false;
        };

        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");

        let response = self
            .http
            .get(VIDEO_OEMBED_URL)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await;

        match response {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("Video link probe failed for {}: {}", link, e);
                false
            }
        }
    }
}
