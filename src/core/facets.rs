//! Facet state machine behind the search input.
//!
//! The input is either free text or a set of committed facet tags plus a
//! free-text remainder. Transitions:
//!
//! | Trigger | Effect |
//! |---------|--------|
//! | typed `kind:value␠…` | commit facet (primary replaces primary), input = rest |
//! | pasted URL / handle, no facet | commit facet with empty value, input = canonical value |
//! | backspace on empty input | drop most recent facet, input = `kind:` |
//! | remove facet control | drop that facet; input cleared if it was the only one |
//! | network search succeeded | `[filter_search:""]`, input cleared |
//!
//! Every change republishes the canonical query on a watch channel.

use std::sync::OnceLock;

use regex::Regex;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::{Facet, FacetKind};

use super::query;
use super::resolver;

fn committed_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(handle|playlist|video|filter_search):(?:"([^"]*)"|(\S*))\s(.*)$"#)
            .expect("facet prefix pattern is valid")
    })
}

/// Where the search input is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchContext {
    /// Submissions go to the content provider
    Network,
    /// Every change filters the library locally
    Library,
}

/// Committed facets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FacetState {
    #[default]
    Empty,

    /// Exactly one facet (primary or filter)
    FacetActive(Facet),

    /// A primary facet plus a local filter (library context only)
    FacetActivePlusFilter {
        primary: Facet,
        filter: Facet,
        /// Which of the two was committed last
        filter_last: bool,
    },
}

impl FacetState {
    /// Facets in render order (primary first)
    pub fn facets(&self) -> Vec<&Facet> {
        match self {
            FacetState::Empty => Vec::new(),
            FacetState::FacetActive(facet) => vec![facet],
            FacetState::FacetActivePlusFilter {
                primary, filter, ..
            } => vec![primary, filter],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FacetState::Empty)
    }

    fn primary(&self) -> Option<&Facet> {
        self.facets().into_iter().find(|f| f.is_primary())
    }
}

/// Result of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryChange {
    /// Canonical query after the change
    pub query: String,

    /// The change itself should run a search (library context)
    pub search_now: bool,
}

/// Facet editing state plus the free-text input
#[derive(Debug)]
pub struct FacetMachine {
    context: SearchContext,
    state: FacetState,
    input: String,
    query_tx: watch::Sender<String>,
}

impl FacetMachine {
    pub fn new(context: SearchContext) -> Self {
        let (query_tx, _) = watch::channel(String::new());
        Self {
            context,
            state: FacetState::Empty,
            input: String::new(),
            query_tx,
        }
    }

    pub fn state(&self) -> &FacetState {
        &self.state
    }

    pub fn facets(&self) -> Vec<&Facet> {
        self.state.facets()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Live feed of the canonical query, updated on every change
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.query_tx.subscribe()
    }

    /// Canonical `kind:value … free text` rendering of the current state
    pub fn canonical_query(&self) -> String {
        query::render(self.state.facets(), &self.input)
    }

    /// Replace the input text (one keystroke or a paste).
    ///
    /// A multi-character insertion with no facet active is treated as a paste
    /// and may auto-upgrade a URL or handle into a facet.
    pub fn set_input(&mut self, text: &str) -> QueryChange {
        let inserted = text.chars().count().saturating_sub(self.input.chars().count());
        self.input = text.to_string();

        if let Some((facet, rest)) = parse_committed_prefix(&self.input) {
            debug!(facet = %facet, "Committing typed facet");
            self.commit(facet);
            self.input = rest;
        } else if inserted > 1 && self.state.is_empty() {
            if let Some((kind, value)) = resolver::recognize_shape(&self.input) {
                debug!(%kind, %value, "Auto-upgrading pasted input to facet");
                self.commit(Facet::new(kind, ""));
                self.input = value;
            }
        }

        self.publish()
    }

    /// Backspace with the caret at the start of the input.
    ///
    /// Returns `None` when there is text to delete or no facet to remove; the
    /// caller then handles the key as a normal backspace.
    pub fn backspace_at_start(&mut self) -> Option<QueryChange> {
        if !self.input.is_empty() {
            return None;
        }

        let removed = match std::mem::take(&mut self.state) {
            FacetState::Empty => return None,
            FacetState::FacetActive(facet) => facet,
            FacetState::FacetActivePlusFilter {
                primary,
                filter,
                filter_last,
            } => {
                let (removed, kept) = if filter_last {
                    (filter, primary)
                } else {
                    (primary, filter)
                };
                self.state = FacetState::FacetActive(kept);
                removed
            }
        };

        self.input = format!("{}:", removed.kind);
        Some(self.publish())
    }

    /// Remove a facet through its explicit control
    pub fn remove_facet(&mut self, kind: FacetKind) -> QueryChange {
        let state = std::mem::take(&mut self.state);
        self.state = match state {
            FacetState::FacetActive(facet) if facet.kind == kind => {
                self.input.clear();
                FacetState::Empty
            }
            FacetState::FacetActivePlusFilter {
                primary, filter, ..
            } if primary.kind == kind => FacetState::FacetActive(filter),
            FacetState::FacetActivePlusFilter {
                primary, filter, ..
            } if filter.kind == kind => FacetState::FacetActive(primary),
            other => other,
        };
        self.publish()
    }

    /// A network search succeeded: turn the input into a local filter console
    pub fn on_search_success(&mut self) -> QueryChange {
        self.state = FacetState::FacetActive(Facet::empty_filter());
        self.input.clear();
        self.publish()
    }

    fn commit(&mut self, facet: Facet) {
        let state = std::mem::take(&mut self.state);
        let library = self.context == SearchContext::Library;

        self.state = match (state, facet.is_primary()) {
            (FacetState::Empty, _) => FacetState::FacetActive(facet),

            // Same role: replace
            (FacetState::FacetActive(current), is_primary) if current.is_primary() == is_primary => {
                FacetState::FacetActive(facet)
            }

            (FacetState::FacetActive(current), is_primary) => {
                if library {
                    let (primary, filter) = if is_primary {
                        (facet, current)
                    } else {
                        (current, facet)
                    };
                    FacetState::FacetActivePlusFilter {
                        primary,
                        filter,
                        filter_last: !is_primary,
                    }
                } else {
                    FacetState::FacetActive(facet)
                }
            }

            (FacetState::FacetActivePlusFilter { filter, .. }, true) => {
                FacetState::FacetActivePlusFilter {
                    primary: facet,
                    filter,
                    filter_last: false,
                }
            }

            (FacetState::FacetActivePlusFilter { primary, .. }, false) => {
                FacetState::FacetActivePlusFilter {
                    primary,
                    filter: facet,
                    filter_last: true,
                }
            }
        };
    }

    fn publish(&mut self) -> QueryChange {
        let query = self.canonical_query();
        self.query_tx.send_replace(query.clone());
        QueryChange {
            query,
            search_now: self.context == SearchContext::Library,
        }
    }

    /// Primary facet currently committed, if any
    pub fn primary(&self) -> Option<&Facet> {
        self.state.primary()
    }
}

/// `kind:value` followed by a space at the start of the input
fn parse_committed_prefix(text: &str) -> Option<(Facet, String)> {
    let caps = committed_prefix().captures(text)?;
    let kind: FacetKind = caps.get(1)?.as_str().parse().ok()?;
    let value = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
        .unwrap_or_default();

    // Primary facets need a value; an empty filter is the bare filter console
    if value.is_empty() && kind.is_primary() {
        return None;
    }

    let rest = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
    Some((Facet::new(kind, value), rest.to_string()))
}
