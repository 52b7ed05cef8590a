use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of the feed collaborator.
#[derive(Debug, Error)]
pub enum FeedError {
    /// No usable session and no way to recover one without an operator.
    #[error("feed authentication failed: {0}")]
    Auth(String),
    #[error("feed request failed: {0}")]
    Transient(String),
    /// The platform answered and declined the request; nothing was created.
    #[error("feed refused request: {0}")]
    Rejected(String),
    #[error("unexpected feed payload: {0}")]
    Malformed(String),
}

impl FeedError {
    pub fn is_transient(&self) -> bool {
        matches!(self, FeedError::Transient(_))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedding has {actual} dimensions, store expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("database error: {0}")]
    Database(#[source] BoxError),
    #[error("codec error: {0}")]
    Codec(#[source] BoxError),
}

impl StoreError {
    pub fn database(e: impl Into<BoxError>) -> Self {
        StoreError::Database(e.into())
    }

    pub fn codec(e: impl Into<BoxError>) -> Self {
        StoreError::Codec(e.into())
    }
}
