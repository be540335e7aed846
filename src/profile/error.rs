use thiserror::Error;

use super::validation::ValidationError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    InvalidArgument(#[from] ValidationError),

    #[error("{0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ProfileError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ProfileError::NotFound(msg),
            StoreError::Conflict(msg) => ProfileError::Conflict(msg),
            other => ProfileError::Store(other),
        }
    }
}
