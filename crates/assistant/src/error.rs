//! Error types for the assistant pipeline.

use thiserror::Error;

/// Errors that can occur while processing a user turn.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Completion service call failed.
    #[error("completion error: {0}")]
    Completion(#[from] completion::CompletionError),

    /// Classification reply carried no parseable JSON object.
    #[error("classification failed: {0}")]
    Classification(String),

    /// Persistence failed.
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    /// Generic failure surfaced to callers; details are in the logs.
    #[error("AI processing failed")]
    ProcessingFailed,
}
