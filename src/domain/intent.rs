//! Search intents and pagination cursors.

use serde::{Deserialize, Serialize};

/// Which retrieval path an intent drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Video,
    Playlist,
    Channel,
    Search,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Video => write!(f, "video"),
            SearchMode::Playlist => write!(f, "playlist"),
            SearchMode::Channel => write!(f, "channel"),
            SearchMode::Search => write!(f, "search"),
        }
    }
}

/// Resolved {mode, target} pair. Derived from input, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    pub mode: SearchMode,

    pub target_id: String,

    /// True when the mode came from an explicit facet token
    #[serde(default)]
    pub forced: bool,
}

impl SearchIntent {
    pub fn new(mode: SearchMode, target_id: impl Into<String>) -> Self {
        Self {
            mode,
            target_id: target_id.into(),
            forced: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.forced = true;
        self
    }
}

/// Source a continuation token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Playlist,
    Channel,
    Search,
}

/// Pagination cursor for the current network result set.
///
/// `token == None` means the source is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationState {
    pub token: Option<String>,

    pub source_id: String,

    pub source_kind: SourceKind,

    /// Pages come from the credentialed channel listing
    pub is_version3_channel: bool,
}

impl ContinuationState {
    pub fn new(source_id: impl Into<String>, source_kind: SourceKind, token: Option<String>) -> Self {
        Self {
            token,
            source_id: source_id.into(),
            source_kind,
            is_version3_channel: false,
        }
    }

    pub fn version3(mut self) -> Self {
        self.is_version3_channel = true;
        self
    }

    pub fn has_more(&self) -> bool {
        self.token.is_some()
    }
}
