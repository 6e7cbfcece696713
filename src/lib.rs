//! kinesis - Search-intent resolution and result aggregation
//!
//! Turns whatever a user types into a search box (a URL, a handle, an id,
//! free text) into a typed intent, then manages the paginated, deduplicated
//! result set, a local filter over it, and chunked bulk saves into a library.
//!
//! # Architecture
//!
//! Data flows leaf to root:
//! - raw text is resolved into a `SearchIntent`
//! - the `Aggregator` fetches pages through a `ContentProvider` and merges
//!   them by id
//! - the local filter narrows the visible set
//! - the `BulkOrchestrator` saves the visible set into a `LibraryStore`
//!
//! # Modules
//!
//! - `adapters`: Content provider trait and the HTTP implementation
//! - `core`: Resolver, facet machine, aggregator, filter, bulk saves
//! - `domain`: Data structures (Video, Facet, SearchIntent)
//! - `library`: Library store trait and the JSON catalog store
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # See how an input is interpreted
//! kinesis resolve "https://youtube.com/watch?v=dQw4w9WgXcQ&list=PLabc1234567"
//!
//! # Load a whole playlist, keep the Rust videos, save them
//! kinesis search "playlist:PLabc1234567 " --all --filter rust --save
//!
//! # Browse the library
//! kinesis library --query async
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use adapters::{ContentProvider, HttpProvider, Page, ProviderError};
pub use crate::core::{Aggregator, BulkOrchestrator, FacetMachine, SearchError};
pub use domain::{Facet, FacetKind, SearchIntent, SearchMode, Video};
pub use library::{JsonLibrary, LibraryStore};
