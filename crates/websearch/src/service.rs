//! Service trait for search backends.

use async_trait::async_trait;

use crate::api_types::SearchResult;
use crate::error::SearchError;

/// Trait for performing web searches and link probes.
///
/// Abstracted so pipeline stages can be exercised against stub backends
/// in tests while production code uses [`crate::SearchClient`].
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Search the web, returning at most `limit` organic results.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;

    /// Check whether a video link still resolves.
    ///
    /// Returns `false` for links whose existence cannot be confirmed.
    async fn probe_video_link(&self, link: &str) -> bool;
}
