//! HTTP client for the completion service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::CompletionConfig;
use crate::error::CompletionError;
use crate::service::CompletionService;

/// Default request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the hosted chat-completion API.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`CompletionConfig::from_env`] for the variables consulted.
    pub fn from_env() -> Result<Self, CompletionError> {
        Self::new(CompletionConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Make a chat completion request and return the full response.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Completion request: model={}", request.model);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Error bodies carry {"error": {"message": ...}}
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(api_error) => api_error.error.message,
                Err(_) => body,
            };

            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        if let Some(ref usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl CompletionService for CompletionClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionError> {
        let completion = self.chat_completion(messages).await?;

        let text = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref());

        match text {
            Some(text) => Ok(text.to_string()),
            None => {
                warn!("Completion response carried no content");
                Err(CompletionError::EmptyResponse)
            }
        }
    }
}
