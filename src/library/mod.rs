//! Video library: the store the bulk orchestrator saves into.
//!
//! The engine only sees the `LibraryStore` trait. `JsonLibrary` keeps the
//! whole library in a single catalog file:
//!
//! ```text
//! ~/.kinesis/
//! └── library.json      # { "version": 1, "items": [Video, ...] }
//! ```

pub mod catalog;
pub mod store;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{LibraryStatus, Video};

pub use catalog::Catalog;
pub use store::JsonLibrary;

/// Result of saving a single video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Saved,
    Exists,
}

impl From<SaveStatus> for LibraryStatus {
    fn from(status: SaveStatus) -> Self {
        match status {
            SaveStatus::Saved => LibraryStatus::Saved,
            SaveStatus::Exists => LibraryStatus::Exists,
        }
    }
}

/// Per-item result of a batched save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: String,
    pub result: std::result::Result<SaveStatus, String>,
}

impl SaveOutcome {
    pub fn ok(id: impl Into<String>, status: SaveStatus) -> Self {
        Self {
            id: id.into(),
            result: Ok(status),
        }
    }

    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: Err(error.into()),
        }
    }
}

/// Trait for video library backends
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Save one video
    async fn save_one(&self, video: &Video) -> Result<SaveStatus>;

    /// Save a batch. An `Err` means the whole batch failed; per-item
    /// failures are reported in the outcomes.
    async fn save_many(&self, videos: &[Video]) -> Result<Vec<SaveOutcome>>;

    /// Delete by id. Returns whether anything was removed.
    async fn delete_one(&self, id: &str) -> Result<bool>;

    async fn exists(&self, id: &str) -> Result<bool>;

    /// Saved videos, most recently added first
    async fn list_saved(&self) -> Result<Vec<Video>>;
}

/// Mark every video the store already holds as `exists`.
///
/// Videos saved earlier in this session keep their `saved` status.
pub async fn annotate_status<S: LibraryStore + ?Sized>(videos: &mut [Video], store: &S) -> Result<usize> {
    let mut marked = 0;
    for video in videos.iter_mut() {
        if video.library_status == Some(LibraryStatus::Saved) {
            continue;
        }
        if store.exists(&video.id).await? {
            video.library_status = Some(LibraryStatus::Exists);
            marked += 1;
        }
    }
    debug!(marked, total = videos.len(), "Annotated library status");
    Ok(marked)
}
