//! Facets: committed, typed interpretations of part of the search input.

use serde::{Deserialize, Serialize};

/// Kind of a facet tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Handle,
    Playlist,
    Video,
    /// Local-only filter over already fetched results
    FilterSearch,
}

impl FacetKind {
    pub const ALL: [FacetKind; 4] = [
        FacetKind::Handle,
        FacetKind::Playlist,
        FacetKind::Video,
        FacetKind::FilterSearch,
    ];

    /// Prefix used in the textual `kind:value` form
    pub fn as_str(self) -> &'static str {
        match self {
            FacetKind::Handle => "handle",
            FacetKind::Playlist => "playlist",
            FacetKind::Video => "video",
            FacetKind::FilterSearch => "filter_search",
        }
    }

    /// Primary kinds select what gets fetched; at most one is active
    pub fn is_primary(self) -> bool {
        !matches!(self, FacetKind::FilterSearch)
    }
}

impl std::fmt::Display for FacetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FacetKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "handle" => Ok(FacetKind::Handle),
            "playlist" => Ok(FacetKind::Playlist),
            "video" => Ok(FacetKind::Video),
            "filter_search" => Ok(FacetKind::FilterSearch),
            _ => anyhow::bail!("Unknown facet kind: {}", s),
        }
    }
}

/// A facet tag such as `handle:@rustlang` or `filter_search:"async io"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    pub kind: FacetKind,
    pub value: String,
}

impl Facet {
    pub fn new(kind: FacetKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// An empty `filter_search` facet: the local filter console with no terms
    pub fn empty_filter() -> Self {
        Self::new(FacetKind::FilterSearch, "")
    }

    pub fn is_primary(&self) -> bool {
        self.kind.is_primary()
    }
}

/// Renders `kind:value`, quoting the value when it contains whitespace
impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.chars().any(char::is_whitespace) {
            write!(f, "{}:\"{}\"", self.kind, self.value)
        } else {
            write!(f, "{}:{}", self.kind, self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_values_with_spaces() {
        assert_eq!(
            Facet::new(FacetKind::Handle, "@rustlang").to_string(),
            "handle:@rustlang"
        );
        assert_eq!(
            Facet::new(FacetKind::FilterSearch, "async io").to_string(),
            "filter_search:\"async io\""
        );
        assert_eq!(Facet::empty_filter().to_string(), "filter_search:");
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in FacetKind::ALL {
            assert_eq!(kind.as_str().parse::<FacetKind>().unwrap(), kind);
        }
        assert!("channel".parse::<FacetKind>().is_err());
    }
}
