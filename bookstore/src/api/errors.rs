use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common_database::{is_timeout_error, CustomDatabaseError};
use common_redis::CustomRedisError;
use thiserror::Error;

/// Everything the record-access layer can surface. `NotFound` is the only
/// variant with caller-visible semantics distinct from a generic failure;
/// `Cache` is produced by invalidation failures only - cache misses are not
/// errors.
#[derive(Error, Debug)]
pub enum BookError {
    #[error("failed to parse request: {0}")]
    RequestParsingError(#[from] serde_json::Error),
    #[error("book not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] CustomDatabaseError),
    #[error("cache invalidation failed: {0}")]
    Cache(CustomRedisError),
}

impl BookError {
    /// Returns (error_code, status_code) for this error, keeping the error
    /// code and HTTP status consistent in one match.
    fn error_metadata(&self) -> (&'static str, StatusCode) {
        match self {
            BookError::RequestParsingError(_) => ("request_parsing_error", StatusCode::BAD_REQUEST),
            BookError::NotFound => ("not_found", StatusCode::NOT_FOUND),
            // Timed-out store calls are a load signal, not a bug
            BookError::Database(CustomDatabaseError::Timeout(_)) => {
                ("database_timeout", StatusCode::SERVICE_UNAVAILABLE)
            }
            BookError::Database(CustomDatabaseError::Other(e)) if is_timeout_error(e) => {
                ("database_timeout", StatusCode::SERVICE_UNAVAILABLE)
            }
            BookError::Database(_) => ("database_error", StatusCode::INTERNAL_SERVER_ERROR),
            BookError::Cache(CustomRedisError::Timeout) => {
                ("cache_timeout", StatusCode::SERVICE_UNAVAILABLE)
            }
            BookError::Cache(_) => ("cache_error", StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Returns a short error code for canonical logging.
    pub fn error_code(&self) -> &'static str {
        self.error_metadata().0
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.error_metadata().1
    }
}

impl IntoResponse for BookError {
    fn into_response(self) -> Response {
        let (code, status) = (self.error_code(), self.status_code());
        if status.is_server_error() {
            tracing::error!(code, "request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
