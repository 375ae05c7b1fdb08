//! Chat-completion HTTP client.
//!
//! This crate provides the typed client for the hosted completion service
//! used by the assistant pipeline. It defines:
//!
//! - [`CompletionService`] - The trait pipeline stages depend on
//! - [`CompletionClient`] - The HTTP implementation
//! - [`ChatMessage`] - Message type for building requests
//! - [`CompletionError`] - Error types for completion operations
//!
//! # Example
//!
//! ```no_run
//! use completion::{ChatMessage, CompletionClient, CompletionConfig, CompletionService};
//!
//! # async fn example() -> Result<(), completion::CompletionError> {
//! let client = CompletionClient::new(CompletionConfig::from_env()?)?;
//! let reply = client
//!     .complete(vec![
//!         ChatMessage::system("You are a helpful assistant."),
//!         ChatMessage::user("Hello!"),
//!     ])
//!     .await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

mod api_types;
mod client;
mod config;
mod error;
mod service;

pub use api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, ResponseMessage,
    Usage,
};
pub use client::CompletionClient;
pub use config::CompletionConfig;
pub use error::CompletionError;
pub use service::CompletionService;

// Re-export async_trait for implementors of CompletionService.
pub use async_trait::async_trait;
