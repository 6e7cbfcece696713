//! Domain types for the search engine.
//!
//! This module contains the core data structures:
//! - Video / ResultSet: what providers return and how pages accumulate
//! - Facet: structured tags carried by the search input
//! - SearchIntent / ContinuationState: what to fetch and where paging stands

pub mod facet;
pub mod intent;
pub mod video;

// Re-export commonly used types
pub use facet::{Facet, FacetKind};
pub use intent::{ContinuationState, SearchIntent, SearchMode, SourceKind};
pub use video::{default_thumbnail, LibraryStatus, ResultSet, Video};
