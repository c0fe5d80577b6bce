//! Error types for the store and the public tree operations.

use thiserror::Error;

/// Failures raised by a document store implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors returned by build, retrieval, aggregation and export.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested query scope, root or key is absent from the store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store unreachable, failing, or past its deadline.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Some upserts of a build batch failed. The others were written.
    #[error("{} of {} node writes failed", failed.len(), failed.len() + succeeded)]
    PartialWriteFailure {
        failed: Vec<(String, String)>,
        succeeded: usize,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    StorageError(#[from] StorageError),
}

impl ApiError {
    /// Keys that failed to persist, empty for every other variant.
    pub fn failed_keys(&self) -> Vec<&str> {
        match self {
            ApiError::PartialWriteFailure { failed, .. } => {
                failed.iter().map(|(key, _)| key.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
