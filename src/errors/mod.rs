//! Error handling module for the banner backend.
//!
//! One error type travels from the store up to the HTTP boundary, where it is
//! mapped to a transport status code and the error envelope.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Envelope status codes carried in the `status` field of every response body.
pub mod codes {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const INTERNAL_ERROR: u16 = 500;
    pub const TIMEOUT: u16 = 504;
}

/// Message returned for every 5xx; the real cause only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Payload or parameter could not be decoded
    #[error("decode error: {0}")]
    Decode(String),
    /// Payload decoded but a required field is missing or empty
    #[error("validation error: {0}")]
    Validation(String),
    /// Missing, malformed or expired credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Valid credential without admin rights
    #[error("forbidden: {0}")]
    NotAdmin(String),
    /// No row matched a read
    #[error("not found: {0}")]
    NotFound(String),
    /// Update/delete matched nothing
    #[error("no rows affected: {0}")]
    NoRowsAffected(String),
    /// Connectivity, constraint or transaction failure
    #[error("store error: {0}")]
    Store(String),
    /// Store call exceeded its deadline
    #[error("timeout: {0}")]
    Timeout(String),
    /// Anything else that is our fault
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Decode(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotAdmin(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::NoRowsAffected(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Get the envelope status code for this error.
    pub fn error_code(&self) -> u16 {
        match self {
            AppError::Decode(_) | AppError::Validation(_) => codes::BAD_REQUEST,
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::NotAdmin(_) => codes::FORBIDDEN,
            AppError::NotFound(_) | AppError::NoRowsAffected(_) => codes::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::Timeout(_) => codes::TIMEOUT,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Decode(msg)
            | AppError::Validation(msg)
            | AppError::Unauthorized(msg)
            | AppError::NotAdmin(msg)
            | AppError::NotFound(msg)
            | AppError::NoRowsAffected(msg)
            | AppError::Store(msg)
            | AppError::Timeout(msg)
            | AppError::Internal(msg) => msg,
        }
    }

    /// Prefix the message with the stage that produced the failure, keeping the kind.
    pub fn context(self, stage: &str) -> Self {
        let wrap = |msg: String| format!("{stage}: {msg}");
        match self {
            AppError::Decode(msg) => AppError::Decode(wrap(msg)),
            AppError::Validation(msg) => AppError::Validation(wrap(msg)),
            AppError::Unauthorized(msg) => AppError::Unauthorized(wrap(msg)),
            AppError::NotAdmin(msg) => AppError::NotAdmin(wrap(msg)),
            AppError::NotFound(msg) => AppError::NotFound(wrap(msg)),
            AppError::NoRowsAffected(msg) => AppError::NoRowsAffected(wrap(msg)),
            AppError::Store(msg) => AppError::Store(wrap(msg)),
            AppError::Timeout(msg) => AppError::Timeout(wrap(msg)),
            AppError::Internal(msg) => AppError::Internal(wrap(msg)),
        }
    }

    /// Whether the message may be shown to the caller as-is.
    pub fn is_client_facing(&self) -> bool {
        !matches!(self, AppError::Store(_) | AppError::Internal(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Store(format!("Database error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::debug!("JSON error: {:?}", err);
        AppError::Decode(format!("malformed JSON: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout("store deadline exceeded".to_string())
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let message = if error.is_client_facing() {
            error.message().to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        };

        Self {
            status: error.error_code(),
            message,
        }
    }

    /// Envelope used when the failure never became an [`AppError`] (panics).
    pub fn internal() -> Self {
        Self {
            status: codes::INTERNAL_ERROR,
            message: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_client_facing() {
            tracing::debug!(error = %self, "request rejected");
        } else {
            tracing::error!(error = %self, "request failed");
        }

        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

/// Converts a panic caught at the router boundary into the internal-error envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "panic recovered in request handler");

    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse::internal())).into_response()
}
