//! Bearer-token authentication module.
//!
//! The middleware turns the `Authorization` header into a [`Principal`] and
//! stores it in the request extensions; handlers then decide whether admin
//! rights are needed.

mod jwt;
mod password;

pub use jwt::*;
pub use password::*;

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;

/// Scheme prefix expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity of the caller as of token issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Principal {
    /// Fail with [`AppError::NotAdmin`] unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::NotAdmin(format!(
                "user {} is not an admin",
                self.user_id
            )))
        }
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            is_admin: claims.is_admin,
        }
    }
}

/// Extract the raw token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("authorization header is missing".to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("authorization header is not valid text".to_string()))?;

    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_string()))
}

/// Decode the principal carried by a request.
pub fn resolve_principal(headers: &HeaderMap, codec: &TokenCodec) -> Result<Principal, AppError> {
    let token = bearer_token(headers)?;
    codec.decode(token).map(Principal::from)
}

/// Authentication layer function that takes the token codec as a parameter.
pub async fn principal_layer(
    codec: Arc<TokenCodec>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_principal(request.headers(), &codec) {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
