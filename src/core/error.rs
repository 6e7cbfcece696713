//! Error taxonomy for intent resolution, paging and bulk saves.

use thiserror::Error;

use crate::adapters::ProviderError;

use super::bulk::BulkTally;

/// Errors surfaced by the search engine
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed id or target; recovered locally with no state change
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Video target did not yield an 11-character id
    #[error("Invalid video id: {0:?}")]
    InvalidVideoId(String),

    /// The provider has no such entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested mode needs an elevated credential that is not configured
    #[error("Credential required for {0} listing")]
    CapabilityRequired(&'static str),

    /// Network or backend failure; accumulated state is kept
    #[error("Provider failure: {0}")]
    ProviderFailure(String),

    /// Some bulk items failed while others succeeded
    #[error("{failed} of {total} items failed to save")]
    PartialBulkFailure { failed: usize, total: usize },

    /// A whole bulk chunk failed; the run stopped after `partial`
    #[error("Bulk save aborted after {} items: {reason}", partial.processed())]
    BulkAborted { partial: BulkTally, reason: String },
}

impl SearchError {
    /// Message suitable for a notification line
    pub fn user_message(&self) -> String {
        match self {
            SearchError::InvalidVideoId(_) => "Video not found.".to_string(),
            SearchError::CapabilityRequired("channel") => {
                "You must import an API Key to search for channels.".to_string()
            }
            SearchError::CapabilityRequired(what) => {
                format!("You must import an API Key to fetch {}s.", what)
            }
            SearchError::NotFound(_) => "No results found.".to_string(),
            SearchError::InvalidInput(msg) => msg.clone(),
            SearchError::ProviderFailure(_) => {
                "Something went wrong while fetching results.".to_string()
            }
            SearchError::PartialBulkFailure { failed, total } => {
                format!("{} of {} videos could not be saved.", failed, total)
            }
            SearchError::BulkAborted { partial, .. } => {
                format!("Bulk save failed. {}", partial.summary())
            }
        }
    }

    /// Whether the error leaves the session usable as-is
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SearchError::BulkAborted { .. })
    }
}

impl From<ProviderError> for SearchError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => SearchError::NotFound(what),
            ProviderError::CredentialRequired(what) => SearchError::CapabilityRequired(what),
            ProviderError::Failure(e) => SearchError::ProviderFailure(format!("{:#}", e)),
        }
    }
}
