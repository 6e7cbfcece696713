//! Catalog of saved videos.
//!
//! Simple JSON-based index that can be searched and listed.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::domain::Video;

use super::SaveStatus;

/// Catalog of all saved videos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Catalog format version
    pub version: u32,

    /// Saved videos in insertion order
    pub items: Vec<Video>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            version: 1,
            items: Vec::new(),
        }
    }

    /// Load the catalog from `path`; a missing file is an empty catalog
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog JSON: {}", path.display()))
    }

    /// Save the catalog to `path`
    pub async fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write catalog: {}", path.display()))?;

        Ok(())
    }

    /// Add a video unless its id is already present.
    ///
    /// New entries are stamped with `dateAdded` and stored without a
    /// session library status.
    pub fn add(&mut self, video: &Video) -> SaveStatus {
        if self.contains(&video.id) {
            return SaveStatus::Exists;
        }

        let mut item = video.clone();
        item.library_status = None;
        item.date_added = Some(Utc::now());
        if item.thumbnail_url.is_empty() {
            item.thumbnail_url = item.thumbnail();
        }
        self.items.push(item);
        SaveStatus::Saved
    }

    /// Get a video by id
    pub fn get(&self, id: &str) -> Option<&Video> {
        self.items.iter().find(|v| v.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Remove a video by id
    pub fn remove(&mut self, id: &str) -> Option<Video> {
        let pos = self.items.iter().position(|v| v.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Search by title or author (case-insensitive substring match)
    pub fn search(&self, query: &str) -> Vec<&Video> {
        let query_lower = query.to_lowercase();

        self.items
            .iter()
            .filter(|v| {
                v.title.to_lowercase().contains(&query_lower)
                    || v.author
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&query_lower))
            })
            .collect()
    }

    /// All videos, most recently added first
    pub fn list(&self, limit: Option<usize>) -> Vec<&Video> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by(|a, b| b.date_added.cmp(&a.date_added));

        if let Some(limit) = limit {
            items.truncate(limit);
        }

        items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_catalog_add_and_get() {
        let mut catalog = Catalog::new();
        let video = Video::new("dQw4w9WgXcQ", "Test Video");

        assert_eq!(catalog.add(&video), SaveStatus::Saved);
        assert_eq!(catalog.add(&video), SaveStatus::Exists);

        assert_eq!(catalog.len(), 1);
        let stored = catalog.get("dQw4w9WgXcQ").unwrap();
        assert!(stored.date_added.is_some());
    }

    #[test]
    fn test_catalog_search() {
        let mut catalog = Catalog::new();
        catalog.add(&Video::new("aaaaaaaaaaa", "Introduction to Rust").with_author("Ferris"));
        catalog.add(&Video::new("bbbbbbbbbbb", "Web Development Tips"));

        assert_eq!(catalog.search("rust").len(), 1);
        assert_eq!(catalog.search("FERRIS").len(), 1);
        assert_eq!(catalog.search("python").len(), 0);
    }

    #[test]
    fn test_catalog_list_newest_first() {
        let mut catalog = Catalog::new();
        catalog.add(&Video::new("aaaaaaaaaaa", "Old"));
        catalog.add(&Video::new("bbbbbbbbbbb", "New"));
        catalog.items[0].date_added = Some(Utc::now() - Duration::days(2));

        let listed = catalog.list(None);
        assert_eq!(listed[0].id, "bbbbbbbbbbb");
        assert_eq!(catalog.list(Some(1)).len(), 1);
    }

    #[test]
    fn test_catalog_remove() {
        let mut catalog = Catalog::new();
        catalog.add(&Video::new("aaaaaaaaaaa", "Test"));

        assert!(catalog.remove("aaaaaaaaaaa").is_some());
        assert!(catalog.remove("aaaaaaaaaaa").is_none());
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_catalog_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("library.json");

        let mut catalog = Catalog::new();
        catalog.add(&Video::new("aaaaaaaaaaa", "Persisted").with_author("Someone"));
        catalog.save(&path).await.unwrap();

        let loaded = Catalog::load(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.items[0].author.as_deref(), Some("Someone"));
    }
}
