//! Video records and the deduplicated result set.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Library membership of a video, as shown next to a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryStatus {
    /// Already present in the library before this session touched it
    Exists,

    /// Saved during this session
    Saved,
}

/// A single video as returned by a content provider or the library store.
///
/// `id` is the natural key. `published_at` and `view_count` are kept as the
/// provider formatted them ("3 days ago", "1.2M views", raw digits, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub thumbnail_url: String,

    #[serde(default)]
    pub published_at: String,

    #[serde(default)]
    pub view_count: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_status: Option<LibraryStatus>,

    /// Only set for items that came out of the library store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
}

impl Video {
    /// Create a video with just an id and title
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            thumbnail_url: default_thumbnail(&id),
            id,
            title: title.into(),
            published_at: String::new(),
            view_count: String::new(),
            author: None,
            library_status: None,
            date_added: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_view_count(mut self, view_count: impl Into<String>) -> Self {
        self.view_count = view_count.into();
        self
    }

    /// Thumbnail to display, falling back to the canonical image for the id
    pub fn thumbnail(&self) -> String {
        if self.thumbnail_url.is_empty() {
            default_thumbnail(&self.id)
        } else {
            self.thumbnail_url.clone()
        }
    }
}

/// Canonical thumbnail URL for a video id
pub fn default_thumbnail(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
}

/// Ordered, id-deduplicated list of videos.
///
/// Insertion order is arrival order. Merging never introduces a second copy
/// of an id that is already present.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    videos: Vec<Video>,
    seen: HashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a result set from a page, dropping repeated ids
    pub fn from_videos(videos: impl IntoIterator<Item = Video>) -> Self {
        let mut set = Self::new();
        set.merge(videos);
        set
    }

    /// Append every video whose id is not present yet.
    ///
    /// Returns the number of videos actually added.
    pub fn merge(&mut self, videos: impl IntoIterator<Item = Video>) -> usize {
        let before = self.videos.len();
        for video in videos {
            if self.seen.insert(video.id.clone()) {
                self.videos.push(video);
            }
        }
        self.videos.len() - before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn clear(&mut self) {
        self.videos.clear();
        self.seen.clear();
    }

    pub fn videos(&self) -> &[Video] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[&str]) -> Vec<Video> {
        ids.iter().map(|id| Video::new(*id, format!("Video {}", id))).collect()
    }

    #[test]
    fn test_merge_skips_known_ids() {
        let mut set = ResultSet::from_videos(page(&["a", "b"]));
        let added = set.merge(page(&["b", "c", "a", "d"]));

        assert_eq!(added, 2);
        let ids: Vec<&str> = set.videos().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merging_same_page_twice_is_idempotent() {
        let mut set = ResultSet::new();
        let first = page(&["x1", "x2", "x2", "x3"]);

        set.merge(first.clone());
        set.merge(first);

        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_video_serializes_camel_case() {
        let video = Video::new("dQw4w9WgXcQ", "Never").with_view_count("1.2M views");
        let json = serde_json::to_value(&video).unwrap();

        assert_eq!(json["viewCount"], "1.2M views");
        assert_eq!(
            json["thumbnailUrl"],
            "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"
        );
        assert!(json.get("libraryStatus").is_none());
    }

    #[test]
    fn test_thumbnail_fallback() {
        let mut video = Video::new("abc", "t");
        video.thumbnail_url.clear();
        assert_eq!(video.thumbnail(), default_thumbnail("abc"));
    }
}
