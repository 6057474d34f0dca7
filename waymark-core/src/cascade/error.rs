//! Errors surfaced by the search cascade.

use thiserror::Error;

use crate::{ProviderError, QueryError};

/// Why a search produced no answer.
///
/// An empty result is not an error; searches that find nothing return
/// `Ok` with an empty list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The request was rejected before any I/O.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),
    /// No local data answered and the network is unreachable.
    #[error("no local results and the network is unavailable")]
    NetworkUnavailable,
    /// Every provider tier failed or came back empty, and at least one
    /// failed; carries the first failure.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The request was cancelled before it started.
    #[error("search was cancelled")]
    Cancelled,
    /// The search worker has shut down.
    #[error("search worker is not running")]
    WorkerStopped,
    /// The request queue is full.
    #[error("too many searches are pending")]
    QueueFull,
}
