use crate::i18n::{MessageKey, Messages};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Result type for edge operations
pub type Result<T> = std::result::Result<T, EdgeError>;

/// Edge error types
#[derive(Error, Debug)]
pub enum EdgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(String),

    #[error("Locale error: {0}")]
    Locale(String),

    #[error("Proxy error: {0}")]
    Proxy(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid backend response: {0}")]
    InvalidBackendResponse(String),

    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EdgeError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            EdgeError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            EdgeError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            EdgeError::NotFound(_) => StatusCode::NOT_FOUND,
            EdgeError::Renderer(_) => StatusCode::BAD_GATEWAY,
            EdgeError::Config(_)
            | EdgeError::InvalidPattern(_)
            | EdgeError::Locale(_)
            | EdgeError::Proxy(_)
            | EdgeError::Backend(_)
            | EdgeError::InvalidBackendResponse(_)
            | EdgeError::Internal(_)
            | EdgeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Catalog entry shown to the caller. Detail stays in the log.
    pub fn message_key(&self) -> MessageKey {
        match self {
            EdgeError::PayloadTooLarge { .. } => MessageKey::UploadTooLarge,
            EdgeError::UnsupportedMediaType(_) => MessageKey::UnsupportedMediaType,
            EdgeError::NotFound(_) => MessageKey::NotFound,
            EdgeError::Renderer(_) => MessageKey::BadGateway,
            _ => MessageKey::InternalError,
        }
    }

    /// Render the error with messages from the caller's negotiated locale
    pub fn into_localized_response(self, messages: &Messages) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = Json(json!({
            "error": messages.get(self.message_key()),
        }));

        (status, body).into_response()
    }
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        self.into_localized_response(&Messages::default())
    }
}
