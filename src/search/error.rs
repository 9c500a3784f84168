//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while building, running or indexing
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Request shape or types are wrong; detected before contacting the engine
    #[error("{0}")]
    InvalidRequest(String),

    /// Engine answered with a non-success status
    #[error("Engine rejected request ({status}): {body}")]
    EngineRejected { status: u16, body: String },

    /// Engine could not be reached
    #[error("Engine transport failed: {0}")]
    Transport(String),

    /// A bulk response reported per-item errors
    #[error("Bulk indexing errors: {0}")]
    BulkItemErrors(String),

    /// Index deletion failed; carries the engine's reason
    #[error("Error deleting index. {0}")]
    DeletionFailed(String),

    /// Product catalog could not be loaded or was empty
    #[error("{0}")]
    Catalog(String),

    /// Presigned URL could not be issued
    #[error("Presigning failed: {0}")]
    Signing(String),

    /// Embedding service failed
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// Payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Transport(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidRequest(msg) => AppError::Validation(msg),
            SearchError::Signing(msg) => AppError::ObjectStore(msg),
            SearchError::Embedding(msg) => AppError::Embedding(msg),
            SearchError::Catalog(msg) => AppError::Processing(msg),
            SearchError::Serialization(msg) => AppError::Serialization(msg),
            other => AppError::Engine(other.to_string()),
        }
    }
}
