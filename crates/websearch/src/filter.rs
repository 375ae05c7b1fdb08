//! Recommendation filtering rules.
//!
//! Book/video recommendations are free resources by policy: links into
//! retail marketplaces are removed, and video links are kept only when an
//! existence probe confirms the video has not been taken down.

use tracing::debug;
use url::Url;

use crate::api_types::SearchResult;
use crate::service::SearchService;

/// Domain tokens that mark a link as a retail marketplace.
const MARKETPLACE_TOKENS: &[&str] = &["amazon."];

/// Hosts that require an existence probe before a link is surfaced.
const VIDEO_HOSTS: &[&str] = &["youtube.com"];

/// Check whether a link points at a retail marketplace.
///
/// Matching is case-insensitive and runs against the host portion when the
/// link parses as a URL, falling back to the raw string otherwise.
pub fn is_marketplace_link(link: &str) -> bool {
    let haystack = match Url::parse(link) {
        Ok(url) => url.host_str().unwrap_or(link).to_ascii_lowercase(),
        Err(_) => link.to_ascii_lowercase(),
    };

    MARKETPLACE_TOKENS
        .iter()
        .any(|token| haystack.contains(token))
}

/// Check whether a link points at a video platform.
pub fn is_video_link(link: &str) -> bool {
    let haystack = match Url::parse(link) {
        Ok(url) => url.host_str().unwrap_or(link).to_ascii_lowercase(),
        Err(_) => link.to_ascii_lowercase(),
    };

    VIDEO_HOSTS.iter().any(|host| haystack.contains(host))
}

/// Extract the video id from a watch URL.
///
/// Returns `None` when the link carries no `v` parameter.
pub fn extract_video_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;

    url.query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// Apply the recommendation rules to a result set.
///
/// Marketplace links are dropped outright; video links are kept only when
/// the probe confirms them. Non-video, non-marketplace links pass through
/// unchanged, preserving the engine's ranking order.
pub async fn filter_recommendations(
    service: &dyn SearchService,
    results: Vec<SearchResult>,
) -> Vec<SearchResult> {
    let mut kept = Vec::with_capacity(results.len());

    for result in results {
        if is_marketplace_link(&result.link) {
            debug!("Dropping marketplace recommendation: {}", result.link);
            continue;
        }

        if is_video_link(&result.link) && !service.probe_video_link(&result.link).await {
            debug!("Dropping unresolvable video recommendation: {}", result.link);
            continue;
        }

        kept.push(result);
    }

    kept
}
