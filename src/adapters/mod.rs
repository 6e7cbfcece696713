//! Adapter interfaces for content providers.
//!
//! The engine never talks to the network itself. Everything it fetches goes
//! through a `ContentProvider`; `HttpProvider` is the bundled implementation
//! that speaks JSON to an external provider service.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Video;

// Re-export the HTTP adapter
pub use http::HttpProvider;

/// One page of videos plus the cursor for the next one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    pub videos: Vec<Video>,

    /// Absent when the source is exhausted
    #[serde(default)]
    pub continuation: Option<String>,
}

impl Page {
    pub fn new(videos: Vec<Video>, continuation: Option<String>) -> Self {
        Self {
            videos,
            continuation,
        }
    }

    /// A page with no further continuation
    pub fn last(videos: Vec<Video>) -> Self {
        Self::new(videos, None)
    }
}

/// Result of resolving a handle or channel URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub channel_name: String,
}

/// Errors reported by a content provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The named capability needs an API credential that was not supplied
    #[error("Credential required for {0}")]
    CredentialRequired(&'static str),

    #[error(transparent)]
    Failure(#[from] anyhow::Error),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Trait for content providers
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Resolve a handle, custom name or channel URL to a channel id
    async fn resolve_channel(&self, query: &str) -> ProviderResult<ChannelInfo>;

    /// Fetch one page of a playlist or channel upload list
    async fn fetch_page(
        &self,
        id: &str,
        is_playlist: bool,
        continuation: Option<&str>,
    ) -> ProviderResult<Page>;

    /// Fetch one page of a channel through the credentialed listing.
    ///
    /// Callers must check that a credential is configured before invoking.
    async fn fetch_channel_page_v3(
        &self,
        query: &str,
        continuation: Option<&str>,
    ) -> ProviderResult<Page>;

    /// Metadata for a single video
    async fn fetch_video_info(&self, id: &str) -> ProviderResult<Video>;

    /// Free-text search. Always a single page; `continuation` is ignored.
    async fn search_free_text(&self, query: &str) -> ProviderResult<Page>;

    /// Transcript text for a video
    async fn fetch_transcript(&self, id: &str) -> ProviderResult<String>;
}
