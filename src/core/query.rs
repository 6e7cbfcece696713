//! Facet-token grammar shared by the resolver, the facet machine and the
//! local filter.
//!
//! A facet token is `kind:value` or `kind:"quoted value"` where kind is one
//! of `handle`, `playlist`, `video`, `filter_search`. Everything that is not a
//! facet token is free text.

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::{Facet, FacetKind};

fn facet_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:^|\s)(handle|playlist|video|filter_search):(?:"([^"]*)"|(\S*))"#)
            .expect("facet token pattern is valid")
    })
}

/// Input split into facet tokens and the remaining free text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Facets in the order they appeared
    pub facets: Vec<Facet>,

    /// Text left after stripping every facet token, whitespace-normalized
    pub free_text: String,
}

impl ParsedQuery {
    /// The last primary facet, if any (later tokens override earlier ones)
    pub fn primary(&self) -> Option<&Facet> {
        self.facets.iter().rev().find(|f| f.is_primary())
    }

    /// The last `filter_search` facet, if any
    pub fn filter(&self) -> Option<&Facet> {
        self.facets
            .iter()
            .rev()
            .find(|f| f.kind == FacetKind::FilterSearch)
    }
}

/// Split `text` into facet tokens and free text
pub fn parse(text: &str) -> ParsedQuery {
    let mut facets = Vec::new();
    let mut rest = String::with_capacity(text.len());
    let mut last_end = 0;

    for caps in facet_token().captures_iter(text) {
        let (Some(whole), Some(kind)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Ok(kind) = kind.as_str().parse::<FacetKind>() else {
            continue;
        };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();

        rest.push_str(&text[last_end..whole.start()]);
        rest.push(' ');
        last_end = whole.end();
        facets.push(Facet::new(kind, value));
    }
    rest.push_str(&text[last_end..]);

    ParsedQuery {
        facets,
        free_text: normalize_whitespace(&rest),
    }
}

/// Canonical query string: facets as `kind:value` followed by free text
pub fn render<'a>(facets: impl IntoIterator<Item = &'a Facet>, free_text: &str) -> String {
    let mut parts: Vec<String> = facets.into_iter().map(|f| f.to_string()).collect();
    let free_text = free_text.trim();
    if !free_text.is_empty() {
        parts.push(free_text.to_string());
    }
    parts.join(" ")
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_has_no_facets() {
        let parsed = parse("  rust   async  tutorial ");
        assert!(parsed.facets.is_empty());
        assert_eq!(parsed.free_text, "rust async tutorial");
    }

    #[test]
    fn test_facet_tokens_are_stripped() {
        let parsed = parse("playlist:PLabc123 extra words");
        assert_eq!(
            parsed.facets,
            vec![Facet::new(FacetKind::Playlist, "PLabc123")]
        );
        assert_eq!(parsed.free_text, "extra words");
    }

    #[test]
    fn test_quoted_values() {
        let parsed = parse(r#"filter_search:"async io" handle:@tokio rest"#);
        assert_eq!(parsed.facets.len(), 2);
        assert_eq!(parsed.facets[0], Facet::new(FacetKind::FilterSearch, "async io"));
        assert_eq!(parsed.facets[1], Facet::new(FacetKind::Handle, "@tokio"));
        assert_eq!(parsed.free_text, "rest");
    }

    #[test]
    fn test_empty_value_leaves_residual_text() {
        let parsed = parse("handle: @MrBeast");
        assert_eq!(parsed.facets, vec![Facet::new(FacetKind::Handle, "")]);
        assert_eq!(parsed.free_text, "@MrBeast");
    }

    #[test]
    fn test_kind_must_start_a_word() {
        let parsed = parse("myvideo:abc");
        assert!(parsed.facets.is_empty());
        assert_eq!(parsed.free_text, "myvideo:abc");
    }

    #[test]
    fn test_primary_prefers_last_token() {
        let parsed = parse("handle:@a filter_search:x video:dQw4w9WgXcQ");
        assert_eq!(parsed.primary().unwrap().kind, FacetKind::Video);
        assert_eq!(parsed.filter().unwrap().value, "x");
    }

    #[test]
    fn test_render_round_trip() {
        let facets = vec![
            Facet::new(FacetKind::Handle, "@rustlang"),
            Facet::new(FacetKind::FilterSearch, "async io"),
        ];
        let rendered = render(&facets, " tokio ");
        assert_eq!(rendered, r#"handle:@rustlang filter_search:"async io" tokio"#);

        let parsed = parse(&rendered);
        assert_eq!(parsed.facets, facets);
        assert_eq!(parsed.free_text, "tokio");
    }
}
