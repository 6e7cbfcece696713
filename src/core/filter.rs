//! Local filter over cached results.
//!
//! Only active when the query carries a `filter_search` facet. The terms are
//! the facet value plus any trailing free text, lowercased and split on
//! whitespace; a video is kept when every term occurs in its title or author.

use crate::domain::Video;

use super::query;

/// Lowercased terms of the query's filter, or `None` when no filter facet is
/// present
pub fn filter_terms(canonical_query: &str) -> Option<Vec<String>> {
    let parsed = query::parse(canonical_query);
    let facet = parsed.filter()?;

    let terms = facet
        .value
        .split_whitespace()
        .chain(parsed.free_text.split_whitespace())
        .map(str::to_lowercase)
        .collect();
    Some(terms)
}

/// Whether `video` matches every term
pub fn matches(video: &Video, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let title = video.title.to_lowercase();
    let author = video.author.as_deref().unwrap_or_default().to_lowercase();
    terms
        .iter()
        .all(|term| title.contains(term.as_str()) || author.contains(term.as_str()))
}

/// Visible subsequence of `videos` for `canonical_query`, order preserved
pub fn filter<'a>(videos: &'a [Video], canonical_query: &str) -> Vec<&'a Video> {
    match filter_terms(canonical_query) {
        Some(terms) if !terms.is_empty() => {
            videos.iter().filter(|v| matches(v, &terms)).collect()
        }
        _ => videos.iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn videos() -> Vec<Video> {
        vec![
            Video::new("aaaaaaaaaaa", "Intro to Go"),
            Video::new("bbbbbbbbbbb", "Rust basics").with_author("Ferris"),
            Video::new("ccccccccccc", "Async Rust in depth").with_author("Tokio Team"),
        ]
    }

    fn ids<'a>(videos: &[&'a Video]) -> Vec<&'a str> {
        videos.iter().map(|v| v.id.as_str()).collect()
    }

    #[test]
    fn test_no_filter_facet_passes_through() {
        let videos = videos();
        let visible = filter(&videos, "go");
        assert_eq!(ids(&visible), vec!["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]);
    }

    #[test]
    fn test_filter_value() {
        let videos = videos();
        let visible = filter(&videos, "filter_search:go");
        assert_eq!(ids(&visible), vec!["aaaaaaaaaaa"]);
    }

    #[test]
    fn test_trailing_text_adds_terms() {
        let videos = videos();
        let visible = filter(&videos, "filter_search: RUST tokio");
        assert_eq!(ids(&visible), vec!["ccccccccccc"]);
    }

    #[test]
    fn test_author_matches() {
        let videos = videos();
        let visible = filter(&videos, "filter_search:ferris");
        assert_eq!(ids(&visible), vec!["bbbbbbbbbbb"]);
    }

    #[test]
    fn test_empty_filter_passes_through() {
        let videos = videos();
        assert_eq!(filter(&videos, "filter_search:").len(), 3);
        assert_eq!(filter_terms("filter_search:"), Some(vec![]));
    }
}
