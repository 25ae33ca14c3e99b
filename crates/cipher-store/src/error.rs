//! Error types for the storage layer.

use cipher_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("value for {key:?} is {size} bytes, over the {limit}-byte quota")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("serialization failed for {key:?}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid store key {0:?}")]
    InvalidKey(String),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn serialization(key: &str, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.to_string(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("project not found: {0}")]
    NotFound(String),

    #[error("project not saved: {0}")]
    NotSaved(#[source] StoreError),

    #[error("failed to load projects: {0}")]
    Load(#[source] StoreError),
}
