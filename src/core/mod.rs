//! Core search engine.
//!
//! This module contains:
//! - Resolver: raw input to a typed search intent
//! - FacetMachine: structured/unstructured search input state
//! - Aggregator: paginated, deduplicated network results
//! - Filter: local narrowing of cached results
//! - BulkOrchestrator: chunked bulk saves with progress

pub mod bulk;
pub mod error;
pub mod facets;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod resolver;

// Re-export commonly used types
pub use bulk::{BulkOrchestrator, BulkProgress, BulkRun, BulkTally, DEFAULT_CHUNK_SIZE};
pub use error::SearchError;
pub use facets::{FacetMachine, FacetState, QueryChange, SearchContext};
pub use filter::filter;
pub use pagination::{Advance, Aggregator, PageWalk, PaginationSettings, Snapshot, WalkSummary};
pub use query::ParsedQuery;
pub use resolver::resolve;
