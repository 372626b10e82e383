//! REST API module.
//!
//! Every handler answers with the `{status, body}` envelope on success and the
//! `{status, message}` envelope (via [`AppError`]) on failure.

mod banners;
mod users;

pub use banners::*;
pub use users::*;

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{codes, AppError};

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: u16,
    pub body: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(body: T) -> Self {
        Self {
            status: codes::OK,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(body: T) -> ApiResult<T> {
    Ok(ApiResponse::new(body))
}

/// Query string as raw key/value pairs; parsing is up to each handler.
pub type RawQuery = HashMap<String, String>;

/// Parse a mandatory id; missing or malformed values are decode errors.
pub fn parse_id(raw: Option<&str>, name: &str) -> Result<i64, AppError> {
    let raw = raw.ok_or_else(|| AppError::Decode(format!("{name} is required")))?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::Decode(format!("{name} must be an integer, got {raw:?}")))
}

/// Parse an optional query parameter, falling back to `default` when it is
/// absent or malformed.
pub fn param_or<T: FromStr>(query: &RawQuery, name: &str, default: T) -> T {
    query
        .get(name)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}
