//! Configuration for the completion client.

use std::env;

use crate::error::CompletionError;

/// Default completion API base URL.
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-distill-llama-70b:free";

/// Configuration for [`crate::CompletionClient`].
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl CompletionConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENROUTER_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENROUTER_API_URL` - API base URL (default: https://openrouter.ai/api)
    /// - `OPENROUTER_MODEL` - Model name
    /// - `OPENROUTER_MAX_TOKENS` - Max tokens (unset by default)
    /// - `OPENROUTER_TEMPERATURE` - Temperature (unset by default)
    pub fn from_env() -> Result<Self, CompletionError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| CompletionError::Configuration("OPENROUTER_API_KEY not set".to_string()))?;

        let api_url =
            env::var("OPENROUTER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_tokens = env::var("OPENROUTER_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok());

        let temperature = env::var("OPENROUTER_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok());

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> CompletionConfigBuilder {
        CompletionConfigBuilder::default()
    }
}

/// Builder for [`CompletionConfig`].
#[derive(Debug, Default)]
pub struct CompletionConfigBuilder {
    config: CompletionConfig,
}

impl CompletionConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CompletionConfig {
        self.config
    }
}
