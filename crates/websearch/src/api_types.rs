//! Search API response types.

use serde::{Deserialize, Serialize};

/// A single search hit surfaced to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title.
    pub title: String,
    /// Snippet text, empty when the engine omits one.
    #[serde(default)]
    pub snippet: String,
    /// Result URL.
    pub link: String,
}

/// Raw search API response. Only `organic_results` is consumed.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
}

/// One entry of `organic_results`; fields the engine may omit are optional.
#[derive(Debug, Deserialize)]
pub(crate) struct OrganicResult {
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub link: Option<String>,
}

impl OrganicResult {
    /// Convert to a [`SearchResult`], returning `None` for entries missing
    /// a title or link.
    pub(crate) fn into_result(self) -> Option<SearchResult> {
        Some(SearchResult {
            title: self.title?,
            snippet: self.snippet.unwrap_or_default(),
            link: self.link?,
        })
    }
}
