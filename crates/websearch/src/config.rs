//! Configuration for the search client.

use std::env;

use crate::error::SearchError;

/// Default search API base URL.
pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// Default search engine parameter.
pub const DEFAULT_ENGINE: &str = "google";

/// Configuration for [`crate::SearchClient`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// API key for authentication.
    pub api_key: String,

    /// API base URL.
    pub base_url: String,

    /// Search engine identifier passed to the API.
    pub engine: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            engine: DEFAULT_ENGINE.to_string(),
        }
    }
}

impl SearchConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `SERPAPI_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `SERPAPI_BASE_URL` - API base URL (default: https://serpapi.com)
    /// - `SERPAPI_ENGINE` - Engine parameter (default: google)
    pub fn from_env() -> Result<Self, SearchError> {
        let api_key = env::var("SERPAPI_KEY")
            .map_err(|_| SearchError::Configuration("SERPAPI_KEY not set".to_string()))?;

        let base_url =
            env::var("SERPAPI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let engine = env::var("SERPAPI_ENGINE").unwrap_or_else(|_| DEFAULT_ENGINE.to_string());

        Ok(Self {
            api_key,
            base_url,
            engine,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the engine parameter.
    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.config.engine = engine.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SearchConfig {
        self.config
    }
}
