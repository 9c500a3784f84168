use crate::api::Envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request shape or types
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search engine rejected a request or reported bulk item errors
    #[error("Engine error: {0}")]
    Engine(String),

    /// No operation is registered for the requested method and resource
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Processing errors the caller should see verbatim
    #[error("Processing error: {0}")]
    Processing(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Object store errors
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// Embedding service errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedOperation(_) => StatusCode::BAD_REQUEST,
            AppError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ObjectStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Embedding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Engine(_) => "ENGINE_ERROR",
            AppError::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            AppError::Processing(_) => "PROCESSING_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::ObjectStore(_) => "OBJECT_STORE_ERROR",
            AppError::Embedding(_) => "EMBEDDING_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message placed in the envelope's `errorMessage`.
    ///
    /// Faults the caller cannot act on collapse to `system_exception`; the
    /// full detail only goes to the log.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Engine(msg) => msg.clone(),
            AppError::ObjectStore(msg) => msg.clone(),
            AppError::Embedding(msg) => msg.clone(),
            AppError::Timeout(msg) => msg.clone(),
            AppError::Processing(msg) => msg.clone(),
            AppError::UnsupportedOperation(_) => "api_not_supported".to_string(),
            AppError::Configuration(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => "system_exception".to_string(),
        }
    }

    /// Build the failure envelope for this error
    pub fn to_envelope(&self) -> Envelope {
        Envelope::failure(self.client_message(), self.status_code())
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                error_code = self.error_code(),
                status_code = status.as_u16(),
                message = %self,
                "Request error"
            );
        } else {
            tracing::info!(
                error_code = self.error_code(),
                status_code = status.as_u16(),
                message = %self,
                "Request rejected"
            );
        }

        self.to_envelope().into_response()
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
