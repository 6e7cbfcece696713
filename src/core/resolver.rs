//! Intent resolution: raw search-box text to a structured `SearchIntent`.
//!
//! Resolution order:
//! 1. Facet tokens (`handle:`, `playlist:`, `video:`) force the mode. An
//!    empty facet value falls back to the residual free text.
//! 2. Otherwise the text is inspected for a video id, a playlist id and a
//!    channel shape, in that precedence.
//! 3. Anything else is a plain free-text search.
//!
//! Resolution is pure. Whether a channel intent can actually be served
//! (credential present or not) is decided by the aggregator.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{FacetKind, SearchIntent, SearchMode};

use super::error::SearchError;
use super::query;

/// Playlist id prefixes recognised without a `list=` parameter
pub const PLAYLIST_PREFIXES: [&str; 6] = ["PL", "UU", "LL", "FL", "RD", "OLAK5uy_"];

fn list_param() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]list=([A-Za-z0-9_-]+)").expect("list pattern is valid"))
}

fn video_url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|shorts/|embed/|live/|v/)|youtu\.be/)([^?&#/\s]*)",
        )
        .expect("video url pattern is valid")
    })
}

fn bare_video_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("video id pattern is valid"))
}

fn channel_url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"youtube\.com/(channel/|@|c/|user/)([^/?#\s]+)")
            .expect("channel url pattern is valid")
    })
}

fn channel_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^UC[A-Za-z0-9_-]{22}$").expect("channel id pattern is valid"))
}

fn handle() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@[A-Za-z0-9_.-]+$").expect("handle pattern is valid"))
}

/// Resolve raw input into an intent.
///
/// Returns `Ok(None)` for a null target (nothing left after stripping facet
/// tokens); callers should treat that as a no-op.
pub fn resolve(raw: &str) -> Result<Option<SearchIntent>, SearchError> {
    let parsed = query::parse(raw);
    let residual = parsed.free_text.as_str();

    if let Some(facet) = parsed.primary() {
        let target = if facet.value.trim().is_empty() {
            residual
        } else {
            facet.value.trim()
        };
        if target.is_empty() {
            return Ok(None);
        }
        return resolve_forced(facet.kind, target).map(Some);
    }

    if residual.is_empty() {
        return Ok(None);
    }

    detect(residual).map(Some)
}

/// Resolve a target whose mode was fixed by a facet token
fn resolve_forced(kind: FacetKind, target: &str) -> Result<SearchIntent, SearchError> {
    let intent = match kind {
        FacetKind::Video => {
            let id = extract_video_id(target).unwrap_or_else(|| target.to_string());
            SearchIntent::new(SearchMode::Video, validate_video_id(id)?)
        }
        FacetKind::Playlist => SearchIntent::new(SearchMode::Playlist, playlist_target(target)),
        FacetKind::Handle => SearchIntent::new(
            SearchMode::Channel,
            channel_target(target).unwrap_or_else(|| target.to_string()),
        ),
        FacetKind::FilterSearch => {
            return Err(SearchError::InvalidInput(
                "filter_search only applies to local results".to_string(),
            ))
        }
    };
    Ok(intent.forced())
}

/// Classify unforced text by precedence: video > playlist > channel > search
fn detect(text: &str) -> Result<SearchIntent, SearchError> {
    if let Some(id) = extract_video_id(text) {
        return Ok(SearchIntent::new(SearchMode::Video, validate_video_id(id)?));
    }

    if let Some(id) = extract_playlist_id(text) {
        return Ok(SearchIntent::new(SearchMode::Playlist, id));
    }

    if let Some(target) = channel_target(text) {
        return Ok(SearchIntent::new(SearchMode::Channel, target));
    }

    Ok(SearchIntent::new(SearchMode::Search, text))
}

/// Whether `id` is a canonical 11-character video id
pub fn is_video_id(id: &str) -> bool {
    bare_video_id().is_match(id)
}

fn validate_video_id(id: String) -> Result<String, SearchError> {
    if is_video_id(&id) {
        Ok(id)
    } else {
        Err(SearchError::InvalidVideoId(id))
    }
}

/// Pull a video id out of a known URL shape, or accept a bare 11-char id.
///
/// The returned id is not validated when it came from a URL.
pub fn extract_video_id(text: &str) -> Option<String> {
    let text = text.trim();
    if let Some(caps) = video_url().captures(text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    if bare_video_id().is_match(text) {
        return Some(text.to_string());
    }
    None
}

/// Pull a playlist id out of a `list=` parameter or a prefixed bare id
pub fn extract_playlist_id(text: &str) -> Option<String> {
    let text = text.trim();
    if let Some(caps) = list_param().captures(text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    is_playlist_id(text).then(|| text.to_string())
}

fn is_playlist_id(text: &str) -> bool {
    PLAYLIST_PREFIXES.iter().any(|prefix| {
        text.strip_prefix(prefix).is_some_and(|rest| {
            rest.len() >= 10
                && rest
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
    })
}

fn playlist_target(text: &str) -> String {
    list_param()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| text.trim().to_string())
}

/// Canonical channel query for a channel URL, a `UC…` id or an `@handle`
pub fn channel_target(text: &str) -> Option<String> {
    let text = text.trim();

    if let Some(caps) = channel_url().captures(text) {
        let kind = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        return Some(match kind {
            "@" => format!("@{}", name),
            _ => name.to_string(),
        });
    }

    if channel_id().is_match(text) || handle().is_match(text) {
        return Some(text.to_string());
    }

    None
}

/// Facet kind a pasted URL or handle should be upgraded to, with its value
pub fn recognize_shape(text: &str) -> Option<(FacetKind, String)> {
    let text = text.trim();
    let looks_like_url = text.contains("youtube.com/") || text.contains("youtu.be/");

    if looks_like_url {
        if let Some(id) = extract_video_id(text) {
            return Some((FacetKind::Video, id));
        }
        if let Some(id) = extract_playlist_id(text) {
            return Some((FacetKind::Playlist, id));
        }
    }

    if looks_like_url || text.starts_with('@') || channel_id().is_match(text) {
        return channel_target(text).map(|target| (FacetKind::Handle, target));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(raw: &str) -> SearchIntent {
        resolve(raw).unwrap().unwrap()
    }

    #[test]
    fn test_playlist_url_uses_list_parameter() {
        let i = intent("https://www.youtube.com/playlist?list=PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf");
        assert_eq!(i.mode, SearchMode::Playlist);
        assert_eq!(i.target_id, "PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf");
        assert!(!i.forced);
    }

    #[test]
    fn test_bare_video_id() {
        let i = intent("dQw4w9WgXcQ");
        assert_eq!(i.mode, SearchMode::Video);
        assert_eq!(i.target_id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_video_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        ] {
            let i = intent(url);
            assert_eq!(i.mode, SearchMode::Video, "{}", url);
            assert_eq!(i.target_id, "dQw4w9WgXcQ", "{}", url);
        }
    }

    #[test]
    fn test_video_beats_playlist() {
        let i = intent("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf");
        assert_eq!(i.mode, SearchMode::Video);
    }

    #[test]
    fn test_short_video_id_is_invalid() {
        let err = resolve("https://youtu.be/abc").unwrap_err();
        assert!(matches!(err, SearchError::InvalidVideoId(ref id) if id == "abc"));
        assert_eq!(err.user_message(), "Video not found.");
    }

    #[test]
    fn test_forced_playlist_with_trailing_space() {
        let i = intent("playlist:PLabc123 ");
        assert_eq!(i.mode, SearchMode::Playlist);
        assert_eq!(i.target_id, "PLabc123");
        assert!(i.forced);
    }

    #[test]
    fn test_forced_facet_beats_detection() {
        let i = intent("handle:dQw4w9WgXcQ");
        assert_eq!(i.mode, SearchMode::Channel);
        assert_eq!(i.target_id, "dQw4w9WgXcQ");
    }

    #[test]
    fn test_empty_facet_value_uses_residual_text() {
        let i = intent("handle: https://www.youtube.com/@MrBeast/videos");
        assert_eq!(i.mode, SearchMode::Channel);
        assert_eq!(i.target_id, "@MrBeast");
        assert!(i.forced);
    }

    #[test]
    fn test_forced_video_with_bad_length() {
        assert!(matches!(
            resolve("video:short"),
            Err(SearchError::InvalidVideoId(_))
        ));
    }

    #[test]
    fn test_video_id_rejects_path_characters() {
        for raw in [
            "video:../../admin",
            "video:ab/cd/ef/gh",
            "https://youtu.be/ab.cd.ef.gh",
            "https://www.youtube.com/watch?v=ab%2F..%2Fxy",
        ] {
            assert!(
                matches!(resolve(raw), Err(SearchError::InvalidVideoId(_))),
                "{}",
                raw
            );
        }
        assert!(is_video_id("dQw4w9WgXcQ"));
        assert!(!is_video_id("dQw4w9WgXc."));
    }

    #[test]
    fn test_channel_shapes() {
        assert_eq!(intent("@MrBeast").mode, SearchMode::Channel);
        assert_eq!(intent("@MrBeast").target_id, "@MrBeast");

        let i = intent("https://www.youtube.com/channel/UCX6OQ3DkcsbYNE6H8uQQuVA");
        assert_eq!(i.mode, SearchMode::Channel);
        assert_eq!(i.target_id, "UCX6OQ3DkcsbYNE6H8uQQuVA");

        assert_eq!(intent("UCX6OQ3DkcsbYNE6H8uQQuVA").mode, SearchMode::Channel);
        assert_eq!(
            intent("https://youtube.com/c/LinusTechTips").target_id,
            "LinusTechTips"
        );
    }

    #[test]
    fn test_prefixed_playlist_id() {
        let i = intent("PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf");
        assert_eq!(i.mode, SearchMode::Playlist);
        // Too short to be a playlist id, falls through to search
        assert_eq!(intent("PLAY ball").mode, SearchMode::Search);
    }

    #[test]
    fn test_free_text_search() {
        let i = intent("rust async tutorial");
        assert_eq!(i.mode, SearchMode::Search);
        assert_eq!(i.target_id, "rust async tutorial");
    }

    #[test]
    fn test_null_targets() {
        assert!(resolve("").unwrap().is_none());
        assert!(resolve("   ").unwrap().is_none());
        assert!(resolve("handle:").unwrap().is_none());
        assert!(resolve("filter_search:go").unwrap().is_none());
    }

    #[test]
    fn test_recognize_shape() {
        assert_eq!(
            recognize_shape("https://youtu.be/dQw4w9WgXcQ"),
            Some((FacetKind::Video, "dQw4w9WgXcQ".to_string()))
        );
        assert_eq!(
            recognize_shape("https://www.youtube.com/playlist?list=PLabc"),
            Some((FacetKind::Playlist, "PLabc".to_string()))
        );
        assert_eq!(
            recognize_shape("@rustlang"),
            Some((FacetKind::Handle, "@rustlang".to_string()))
        );
        assert_eq!(recognize_shape("dQw4w9WgXcQ"), None);
        assert_eq!(recognize_shape("just words"), None);
    }
}
