//! Service trait for completion backends.

use async_trait::async_trait;

use crate::api_types::ChatMessage;
use crate::error::CompletionError;

/// Trait for sending a message sequence to a completion backend.
///
/// Abstracted so pipeline stages can be exercised against stub backends
/// in tests while production code uses [`crate::CompletionClient`].
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send the messages to the backend and return the reply text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionError>;
}
