//! `LibraryStore` backed by a single JSON catalog file.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::Video;

use super::{Catalog, LibraryStore, SaveOutcome, SaveStatus};

/// JSON-file library. Every operation loads, edits and rewrites the file
/// under one lock.
pub struct JsonLibrary {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLibrary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the library at the configured location
    pub fn from_config(config: &crate::config::ResolvedConfig) -> Self {
        Self::new(config.library_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only view of the catalog
    pub async fn catalog(&self) -> Result<Catalog> {
        let _guard = self.lock.lock().await;
        Catalog::load(&self.path).await
    }
}

#[async_trait]
impl LibraryStore for JsonLibrary {
    #[instrument(skip(self, video), fields(id = %video.id))]
    async fn save_one(&self, video: &Video) -> Result<SaveStatus> {
        let _guard = self.lock.lock().await;
        let mut catalog = Catalog::load(&self.path).await?;

        let status = catalog.add(video);
        if status == SaveStatus::Saved {
            catalog.save(&self.path).await?;
        }
        debug!(?status, "Saved video");
        Ok(status)
    }

    #[instrument(skip(self, videos), fields(count = videos.len()))]
    async fn save_many(&self, videos: &[Video]) -> Result<Vec<SaveOutcome>> {
        let _guard = self.lock.lock().await;
        let mut catalog = Catalog::load(&self.path).await?;

        let outcomes: Vec<SaveOutcome> = videos
            .iter()
            .map(|video| {
                if video.id.trim().is_empty() {
                    SaveOutcome::failed(&video.id, "missing video id")
                } else {
                    SaveOutcome::ok(&video.id, catalog.add(video))
                }
            })
            .collect();

        if outcomes
            .iter()
            .any(|o| o.result == Ok(SaveStatus::Saved))
        {
            catalog.save(&self.path).await?;
        }
        Ok(outcomes)
    }

    async fn delete_one(&self, id: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut catalog = Catalog::load(&self.path).await?;

        let removed = catalog.remove(id).is_some();
        if removed {
            catalog.save(&self.path).await?;
        }
        Ok(removed)
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.catalog().await?.contains(id))
    }

    async fn list_saved(&self) -> Result<Vec<Video>> {
        let catalog = self.catalog().await?;
        Ok(catalog.list(None).into_iter().cloned().collect())
    }
}
