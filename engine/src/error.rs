//! Error types for the Clip engine.

use crate::FavoriteId;
use thiserror::Error;

/// All possible errors from the Clip engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Mutation lifecycle errors
    #[error("a mutation for favorite '{0}' is already in flight")]
    MutationInFlight(FavoriteId),

    #[error("mutation has already been committed or rolled back")]
    MutationSettled,

    // Reconciliation errors
    #[error("favorite '{0}' is not the in-flight reconciliation entry")]
    NotInFlight(FavoriteId),

    // Storage decoding errors
    #[error("invalid stored favorites value: {0}")]
    InvalidStoredSet(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
