use thiserror::Error;
use umbra_core::{FeedError, StoreError};

/// Why a cycle ended without publishing. Everything except [`CycleError::Fatal`]
/// only aborts the current cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("perception failed: {0}")]
    Perception(#[source] FeedError),
    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("generation failed: {0:#}")]
    Generation(anyhow::Error),
    #[error("generated content rejected: {0}")]
    Validation(String),
    #[error("publish failed: {0}")]
    Publish(#[source] FeedError),
    /// No usable session and no credentials to recover one.
    #[error("fatal: {0}")]
    Fatal(#[source] FeedError),
}

impl CycleError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CycleError::Fatal(_))
    }

    /// Authentication failures are fatal wherever they surface.
    pub(crate) fn from_feed(e: FeedError, wrap: fn(FeedError) -> CycleError) -> Self {
        match e {
            FeedError::Auth(_) => CycleError::Fatal(e),
            other => wrap(other),
        }
    }
}
