//! Web-search client and recommendation filtering.
//!
//! Wraps the hosted search API behind [`SearchService`] and provides the
//! filtering rules applied to book/video recommendations before they are
//! surfaced to users: retail-marketplace links are dropped, and video links
//! must still resolve.

mod api_types;
mod client;
mod config;
mod error;
mod filter;
mod service;

pub use api_types::SearchResult;
pub use client::SearchClient;
pub use config::SearchConfig;
pub use error::SearchError;
pub use filter::{extract_video_id, filter_recommendations, is_marketplace_link, is_video_link};
pub use service::SearchService;

pub use async_trait::async_trait;
