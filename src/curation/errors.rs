use thiserror::Error;

/// Errors that can occur during a curation search.
#[derive(Debug, Error)]
pub enum CurationError {
    /// Filter specification violates an invariant (tempo range, target).
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Collection read or write failed; the search cannot proceed.
    #[error("Store error: {0}")]
    Store(String),

    /// Saved-status reconciliation against the streaming service failed.
    /// Writes from batches completed before the failure are kept.
    #[error("Saved-status sync failed: {0}")]
    Sync(String),

    /// Playlist creation or track-add on the streaming service failed.
    #[error("Publish failed: {0}")]
    Publish(String),

    /// No usable access token for an operation that requires one.
    #[error("Not authenticated with the streaming service")]
    NotAuthenticated,
}

impl From<sqlx::Error> for CurationError {
    fn from(e: sqlx::Error) -> Self {
        CurationError::Store(e.to_string())
    }
}
