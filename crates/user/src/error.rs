use std::time::Duration;

use thiserror::Error;

/// Failure talking to the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Timeout(_))
    }
}

impl From<StoreError> for lnatprep_shared::Error {
    fn from(value: StoreError) -> Self {
        Self::Unavailable(value.to_string())
    }
}
