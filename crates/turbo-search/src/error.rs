//! Search error types.

use edge_data::FetchError;
use edge_executor::Cancelled;
use thiserror::Error;
use turbo_commerce::CommerceError;

/// Errors surfaced by the search layer.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Network or server failure. The only kind that reaches user-visible state.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The request was superseded or torn down. Never shown to users.
    #[error("request cancelled")]
    Cancelled,

    /// The request could not be built.
    #[error(transparent)]
    Request(#[from] CommerceError),
}

impl SearchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}

impl From<Cancelled> for SearchError {
    fn from(_: Cancelled) -> Self {
        SearchError::Cancelled
    }
}
